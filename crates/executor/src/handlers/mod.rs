//! Command handlers organized by entity.
//!
//! | Module | Commands | Entity |
//! |--------|----------|--------|
//! | `registry` | 5 | Registry, model, snapshot |
//! | `groups` | 4 | Group |
//! | `resources` | 2 | Resource |
//! | `versions` | 6 | Version |
//! | `meta` | 3 | Meta |

pub mod groups;
pub mod meta;
pub mod registry;
pub mod resources;
pub mod versions;
