//! Microsecond-precision timestamp type
//!
//! Every registry entity carries a `createdat` and a `modifiedat` stamp. Both
//! are `Timestamp`s, and all stamps written by one transaction share the
//! transaction's single clock reading.
//!
//! ## Precision
//!
//! Timestamps are stored as microseconds since Unix epoch
//! (1970-01-01 00:00:00 UTC). On the wire they render as RFC 3339 strings,
//! which is what the attribute validator hands us for `createdat`.
//!
//! ```
//! use xreg_core::Timestamp;
//!
//! let ts = Timestamp::parse_rfc3339("2023-01-01T00:00:00Z").unwrap();
//! assert_eq!(ts.to_rfc3339(), "2023-01-01T00:00:00Z");
//! ```

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Microsecond-precision timestamp
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are always in microseconds
/// - Timestamps are totally ordered; ordering of sibling versions relies on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create a timestamp for the current moment
    ///
    /// Returns epoch (0) if the system clock is before Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get seconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// The smallest timestamp strictly after this one
    #[inline]
    pub const fn next(&self) -> Self {
        Timestamp(self.0.saturating_add(1))
    }

    /// Parse an RFC 3339 string (`2024-05-01T10:00:00Z`, offsets allowed)
    ///
    /// Instants before Unix epoch are rejected.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        let parsed = DateTime::parse_from_rfc3339(s).ok()?;
        let micros = parsed.with_timezone(&Utc).timestamp_micros();
        u64::try_from(micros).ok().map(Timestamp)
    }

    /// Render as RFC 3339 in UTC
    ///
    /// Sub-second digits are only emitted when present.
    pub fn to_rfc3339(&self) -> String {
        let micros = i64::try_from(self.0).unwrap_or(i64::MAX);
        match Utc.timestamp_micros(micros).single() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => self.0.to_string(),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Timestamp::from_micros(micros)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
