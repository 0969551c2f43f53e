//! Error conversion from internal error types.
//!
//! This module provides conversions from [`RegistryError`] to the executor's
//! [`Error`] type. Typed IDs and epochs become strings and integers; nothing
//! else is dropped.

use xreg_core::{RegistryError, VersionId, XidError};

use crate::Error;

fn ids(ids: Vec<VersionId>) -> Vec<String> {
    ids.into_iter().map(VersionId::into_inner).collect()
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownAncestor { subject, missing } => Error::UnknownAncestor {
                subject: subject.to_string(),
                missing: ids(missing),
            },
            RegistryError::CircularAncestor { subject, ids: members } => Error::CircularAncestor {
                subject: subject.to_string(),
                ids: ids(members),
            },
            RegistryError::TooManyRootVersions { subject, count } => Error::TooManyRootVersions {
                subject: subject.to_string(),
                count,
            },
            RegistryError::BadRequest { subject, reason } => Error::BadRequest {
                subject: subject.to_string(),
                reason,
            },
            RegistryError::UnknownId { subject, id } => Error::UnknownId {
                subject: subject.to_string(),
                id: id.into_inner(),
            },
            RegistryError::MismatchedEpoch {
                subject,
                expected,
                actual,
            } => Error::MismatchedEpoch {
                subject: subject.to_string(),
                expected: expected.as_u64(),
                actual: actual.as_u64(),
            },
            RegistryError::GraphInvalid { subject, reason } => Error::GraphInvalid {
                subject: subject.to_string(),
                reason,
            },
            RegistryError::NotFound { subject } => Error::NotFound {
                subject: subject.to_string(),
            },
            RegistryError::AlreadyExists { subject } => Error::AlreadyExists {
                subject: subject.to_string(),
            },
            RegistryError::InvalidId { value, reason } => Error::InvalidId {
                value,
                reason: reason.to_string(),
            },
            RegistryError::InvalidInput { reason } => Error::InvalidInput { reason },
            RegistryError::Storage { reason } => Error::Io { reason },
            RegistryError::Internal { reason } => Error::Internal { reason },
        }
    }
}

/// Convert an ID validation failure for `value`
pub(crate) fn invalid_id(value: &str, reason: XidError) -> Error {
    RegistryError::invalid_id(value, reason).into()
}

/// Convert a `RegistryError` result into an executor result.
pub(crate) fn convert_result<T>(r: xreg_core::Result<T>) -> crate::Result<T> {
    r.map_err(Error::from)
}
