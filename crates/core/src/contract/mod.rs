//! Contract types shared by every layer
//!
//! - `entity_path`: Universal entity addressing (error subjects)
//! - `epoch`: Per-entity optimistic-concurrency counter
//! - `timestamp`: Microsecond timestamps with RFC 3339 rendering
//! - `xid`: Entity ID validation rules

pub mod entity_path;
pub mod epoch;
pub mod timestamp;
pub mod xid;

// Re-exports
pub use entity_path::EntityPath;
pub use epoch::Epoch;
pub use timestamp::Timestamp;
pub use xid::{validate_xid, XidError, MAX_XID_LENGTH};
