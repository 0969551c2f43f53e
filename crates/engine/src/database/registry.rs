//! Process-wide table of open registries
//!
//! Opening the same data directory twice returns the same `Registry`, so two
//! handles never race on one snapshot file. Entries are weak and disappear
//! once the last handle is dropped.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Weak;

use super::Registry;

/// Open registries keyed by data directory
pub static OPEN_REGISTRIES: Lazy<Mutex<HashMap<PathBuf, Weak<Registry>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
