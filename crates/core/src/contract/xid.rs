//! Entity identifier validation
//!
//! Group, Resource and Version IDs all follow the same rule:
//!
//! - Length: 1-128 characters
//! - First character: `[a-zA-Z0-9_]`
//! - Remaining characters: `[a-zA-Z0-9_.\-~@]`
//!
//! IDs are case-sensitive for identity but compared case-insensitively when
//! ordering sibling versions.
//!
//! Valid: `"v1"`, `"1.0.0"`, `"release~rc1"`, `"_draft"`
//!
//! Invalid: `""`, `"-v1"`, `".hidden"`, `"has spaces"`, `"a/b"`

use std::fmt;

/// Maximum length of an entity ID
pub const MAX_XID_LENGTH: usize = 128;

/// Error when validating an entity ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XidError {
    /// ID is empty
    Empty,
    /// ID exceeds maximum length
    TooLong {
        /// Actual length of the ID
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// ID contains an invalid character
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },
    /// ID starts with an invalid character
    InvalidStart {
        /// The invalid starting character
        char: char,
    },
}

impl fmt::Display for XidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XidError::Empty => write!(f, "ID cannot be empty"),
            XidError::TooLong { length, max } => {
                write!(f, "ID too long: {} chars (max {})", length, max)
            }
            XidError::InvalidChar { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
            XidError::InvalidStart { char } => {
                write!(
                    f,
                    "ID cannot start with '{}' (must start with alphanumeric or underscore)",
                    char
                )
            }
        }
    }
}

impl std::error::Error for XidError {}

/// Validate an entity ID
pub fn validate_xid(id: &str) -> Result<(), XidError> {
    let Some(first) = id.chars().next() else {
        return Err(XidError::Empty);
    };

    if id.len() > MAX_XID_LENGTH {
        return Err(XidError::TooLong {
            length: id.len(),
            max: MAX_XID_LENGTH,
        });
    }

    if !first.is_ascii_alphanumeric() && first != '_' {
        return Err(XidError::InvalidStart { char: first });
    }

    for (pos, ch) in id.chars().enumerate() {
        if !is_valid_char(ch) {
            return Err(XidError::InvalidChar {
                char: ch,
                position: pos,
            });
        }
    }

    Ok(())
}

#[inline]
fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~' | '@')
}
