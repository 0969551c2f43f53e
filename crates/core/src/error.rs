//! Error types for the registry
//!
//! This module defines the error taxonomy shared by every layer. We use
//! `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every user-facing variant carries the `EntityPath` of the offending entity
//! so the HTTP collaborator can render it as the error's subject. All of them
//! abort the surrounding transaction; none are retried.

use crate::contract::{EntityPath, Epoch, XidError};
use crate::types::VersionId;
use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

fn join_ids(ids: &[VersionId]) -> String {
    ids.iter()
        .map(VersionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error types for the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// One or more `ancestor` values name a version that exists neither in
    /// the resource nor in the current batch
    #[error("{subject}: unknown ancestor(s): {}", join_ids(.missing))]
    UnknownAncestor {
        /// Resource the batch targeted
        subject: EntityPath,
        /// Missing ancestor IDs, sorted and deduplicated
        missing: Vec<VersionId>,
    },

    /// The ancestor graph would contain at least one cycle
    #[error("{subject}: circular ancestor chain between versions: {}", join_ids(.ids))]
    CircularAncestor {
        /// Resource the batch targeted
        subject: EntityPath,
        /// Every version involved in any cycle, sorted and deduplicated
        ids: Vec<VersionId>,
    },

    /// `singleversionroot` is enabled and the forest has more than one root
    #[error("{subject}: too many root versions ({count}), only one is allowed")]
    TooManyRootVersions {
        /// Offending resource
        subject: EntityPath,
        /// Number of roots found
        count: usize,
    },

    /// Request is well-formed but not acceptable
    #[error("{subject}: bad request: {reason}")]
    BadRequest {
        /// Entity the request was aimed at
        subject: EntityPath,
        /// Human readable reason
        reason: String,
    },

    /// A referenced version (e.g. a replacement default) does not exist
    #[error("{subject}: unknown version id '{id}'")]
    UnknownId {
        /// Resource the reference was resolved in
        subject: EntityPath,
        /// The ID that could not be found
        id: VersionId,
    },

    /// Optimistic concurrency check failed
    #[error("{subject}: epoch mismatch: expected {expected}, current is {actual}")]
    MismatchedEpoch {
        /// Entity whose epoch was checked
        subject: EntityPath,
        /// Epoch supplied by the caller
        expected: Epoch,
        /// Epoch currently stored
        actual: Epoch,
    },

    /// Internal invariant violation in the ancestry graph (a bug, never a
    /// validation failure)
    #[error("{subject}: ancestry graph invariant violated: {reason}")]
    GraphInvalid {
        /// Resource whose graph is broken
        subject: EntityPath,
        /// What was found
        reason: String,
    },

    /// Addressed entity does not exist
    #[error("{subject}: not found")]
    NotFound {
        /// The missing entity
        subject: EntityPath,
    },

    /// Entity already exists
    #[error("{subject}: already exists")]
    AlreadyExists {
        /// The existing entity
        subject: EntityPath,
    },

    /// An ID does not follow the ID rules
    #[error("invalid id '{value}': {reason}")]
    InvalidId {
        /// The rejected value
        value: String,
        /// Validation failure
        reason: XidError,
    },

    /// Invalid input outside of any single entity (config, model, ...)
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human readable reason
        reason: String,
    },

    /// Persistence layer failure
    #[error("storage error: {reason}")]
    Storage {
        /// Underlying failure
        reason: String,
    },

    /// Internal error (bug or invariant violation outside the graph)
    #[error("internal error: {reason}")]
    Internal {
        /// What went wrong
        reason: String,
    },
}

impl RegistryError {
    /// Create an InvalidInput error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RegistryError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(reason: impl Into<String>) -> Self {
        RegistryError::Storage {
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        RegistryError::Internal {
            reason: reason.into(),
        }
    }

    /// Create a BadRequest error
    pub fn bad_request(subject: impl Into<EntityPath>, reason: impl Into<String>) -> Self {
        RegistryError::BadRequest {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(subject: impl Into<EntityPath>) -> Self {
        RegistryError::NotFound {
            subject: subject.into(),
        }
    }

    /// Wrap an ID validation failure
    pub fn invalid_id(value: impl Into<String>, reason: XidError) -> Self {
        RegistryError::InvalidId {
            value: value.into(),
            reason,
        }
    }

    /// The entity this error is about, when there is one
    pub fn subject(&self) -> Option<&EntityPath> {
        match self {
            RegistryError::UnknownAncestor { subject, .. }
            | RegistryError::CircularAncestor { subject, .. }
            | RegistryError::TooManyRootVersions { subject, .. }
            | RegistryError::BadRequest { subject, .. }
            | RegistryError::UnknownId { subject, .. }
            | RegistryError::MismatchedEpoch { subject, .. }
            | RegistryError::GraphInvalid { subject, .. }
            | RegistryError::NotFound { subject }
            | RegistryError::AlreadyExists { subject } => Some(subject),
            RegistryError::InvalidId { .. }
            | RegistryError::InvalidInput { .. }
            | RegistryError::Storage { .. }
            | RegistryError::Internal { .. } => None,
        }
    }

    /// Check if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// Check if this error is a caller-side validation failure
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RegistryError::UnknownAncestor { .. }
                | RegistryError::CircularAncestor { .. }
                | RegistryError::TooManyRootVersions { .. }
                | RegistryError::BadRequest { .. }
                | RegistryError::UnknownId { .. }
                | RegistryError::MismatchedEpoch { .. }
                | RegistryError::InvalidId { .. }
                | RegistryError::InvalidInput { .. }
        )
    }

    /// Check if this error is a bug rather than a user mistake
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegistryError::GraphInvalid { .. } | RegistryError::Internal { .. }
        )
    }
}
