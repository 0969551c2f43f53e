//! xRegistry - version ancestry and lifecycle engine
//!
//! A registry holds Groups, Groups hold Resources, and every Resource keeps
//! a set of Versions linked by `ancestor` references. The engine keeps that
//! graph acyclic, orders it oldest-first, tracks the default version, prunes
//! to the retention cap and cascades epoch bumps up to the Registry.
//!
//! # Quick Start
//!
//! ```ignore
//! use xregistry::{Command, Executor, Output, Registry};
//!
//! let executor = Executor::new(Registry::ephemeral()?);
//! executor.execute(Command::GroupCreate {
//!     group_type: "dirs".into(),
//!     group_id: "d1".into(),
//!     attributes: Default::default(),
//! })?;
//!
//! let cmd: Command = serde_json::from_str(
//!     r#"{"VersionsPut": {"group_type": "dirs", "group_id": "d1",
//!         "resource_type": "files", "resource_id": "f1",
//!         "versions": {"v1": {}, "v2": {"ancestor": "v1"}}}}"#,
//! )?;
//! executor.execute(cmd)?;
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`] which provides a command-based
//! API. Storage, locking and the ancestry engine are internal; only the
//! executor API is public.

pub use xreg_executor::*;
