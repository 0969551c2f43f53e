//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: No error information is lost in conversion from internal errors
//!
//! Subjects are entity paths rendered as strings, e.g.
//! `/dirs/d1/files/f1/versions/v2`.

use serde::{Deserialize, Serialize};

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Ancestry | `UnknownAncestor`, `CircularAncestor`, `TooManyRootVersions` | Rejected version graph |
/// | Request | `BadRequest`, `UnknownId`, `InvalidId`, `InvalidInput` | Bad input |
/// | Concurrency | `MismatchedEpoch` | Stale epoch |
/// | State | `NotFound`, `AlreadyExists` | Entity existence |
/// | System | `GraphInvalid`, `Io`, `Internal` | Bugs and infrastructure |
///
/// # Example
///
/// ```ignore
/// use xreg_executor::{Command, Error, Executor};
///
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::MismatchedEpoch { subject, expected, actual }) => {
///         println!("{} is at epoch {}, not {}", subject, actual, expected);
///     }
///     Err(e) => {
///         println!("Error: {}", e);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Ancestry ====================
    /// Ancestors named in the request don't exist
    #[error("{subject}: unknown ancestor(s): {}", .missing.join(", "))]
    UnknownAncestor { subject: String, missing: Vec<String> },

    /// The request would make the ancestor graph cyclic
    #[error("{subject}: circular ancestor chain between versions: {}", .ids.join(", "))]
    CircularAncestor { subject: String, ids: Vec<String> },

    /// More than one root while the model allows one
    #[error("{subject}: too many root versions ({count}), only one is allowed")]
    TooManyRootVersions { subject: String, count: usize },

    // ==================== Request ====================
    /// Well-formed but unacceptable request
    #[error("{subject}: bad request: {reason}")]
    BadRequest { subject: String, reason: String },

    /// A referenced version does not exist
    #[error("{subject}: unknown version id '{id}'")]
    UnknownId { subject: String, id: String },

    /// Malformed entity ID
    #[error("invalid id '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    /// Invalid input outside of any single entity
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // ==================== Concurrency ====================
    /// Optimistic concurrency check failed
    #[error("{subject}: epoch mismatch: expected {expected}, current is {actual}")]
    MismatchedEpoch {
        subject: String,
        expected: u64,
        actual: u64,
    },

    // ==================== State ====================
    /// Addressed entity does not exist
    #[error("{subject}: not found")]
    NotFound { subject: String },

    /// Entity already exists
    #[error("{subject}: already exists")]
    AlreadyExists { subject: String },

    // ==================== System ====================
    /// Ancestry graph invariant violated (a bug)
    #[error("{subject}: ancestry graph invariant violated: {reason}")]
    GraphInvalid { subject: String, reason: String },

    /// I/O error
    #[error("I/O error: {reason}")]
    Io { reason: String },

    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Entity path the error is about, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            Error::UnknownAncestor { subject, .. }
            | Error::CircularAncestor { subject, .. }
            | Error::TooManyRootVersions { subject, .. }
            | Error::BadRequest { subject, .. }
            | Error::UnknownId { subject, .. }
            | Error::MismatchedEpoch { subject, .. }
            | Error::NotFound { subject }
            | Error::AlreadyExists { subject }
            | Error::GraphInvalid { subject, .. } => Some(subject),
            Error::InvalidId { .. }
            | Error::InvalidInput { .. }
            | Error::Io { .. }
            | Error::Internal { .. } => None,
        }
    }
}
