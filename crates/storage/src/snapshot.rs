//! On-disk snapshot of a registry
//!
//! A snapshot captures the complete committed state (registry record, model,
//! groups, resources) as one JSON document. Snapshots use the
//! write-fsync-rename pattern for crash safety:
//!
//! 1. Write to `.registry.json.tmp` in the same directory
//! 2. fsync the temporary file
//! 3. Atomic rename to `registry.json`
//!
//! A reader therefore sees either the previous snapshot or the new one,
//! never a torn file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use xreg_core::{GroupRecord, RegistryError, RegistryModel, RegistryRecord, ResourceRecord};

use crate::store::StoreState;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// File name of the snapshot inside the data directory
pub const SNAPSHOT_FILE_NAME: &str = "registry.json";

const SNAPSHOT_TEMP_NAME: &str = ".registry.json.tmp";

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem failure
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed snapshot document
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    /// Snapshot written by an incompatible format
    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },
}

impl From<SnapshotError> for RegistryError {
    fn from(e: SnapshotError) -> Self {
        RegistryError::storage(e.to_string())
    }
}

/// Serialized form of a registry
///
/// Map-keyed state is flattened to lists since JSON object keys must be
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Format version
    pub format_version: u32,
    /// Commit version at capture time
    pub commit_version: u64,
    /// Registry record
    pub registry: RegistryRecord,
    /// Model in force at capture time
    pub model: RegistryModel,
    /// Every group
    pub groups: Vec<GroupRecord>,
    /// Every resource with its versions
    pub resources: Vec<ResourceRecord>,
}

impl StoreSnapshot {
    /// Capture committed state and model
    pub fn capture(state: StoreState, commit_version: u64, model: RegistryModel) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            commit_version,
            registry: state.registry,
            model,
            groups: state.groups.into_values().collect(),
            resources: state.resources.into_values().collect(),
        }
    }

    /// Rebuild the store state
    pub fn into_state(self) -> (StoreState, u64, RegistryModel) {
        let mut state = StoreState::new(self.registry);
        for group in self.groups {
            state.groups.insert(group.key.clone(), group);
        }
        for resource in self.resources {
            state.resources.insert(resource.key.clone(), resource);
        }
        (state, self.commit_version, self.model)
    }
}

/// Path of the snapshot file inside `dir`
pub fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join(SNAPSHOT_FILE_NAME)
}

/// Write a snapshot into `dir`, replacing any previous one atomically
pub fn save_snapshot(dir: &Path, snapshot: &StoreSnapshot) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;
    let temp_path = dir.join(SNAPSHOT_TEMP_NAME);
    let final_path = snapshot_path(dir);

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&temp_path, &final_path)?;

    info!(
        target: "xreg::snapshot",
        path = %final_path.display(),
        commit_version = snapshot.commit_version,
        groups = snapshot.groups.len(),
        resources = snapshot.resources.len(),
        "Snapshot written"
    );
    Ok(final_path)
}

/// Load the snapshot in `dir`
///
/// Returns `Ok(None)` when the directory holds no snapshot yet. A leftover
/// temporary file from an interrupted save is ignored.
pub fn load_snapshot(dir: &Path) -> Result<Option<StoreSnapshot>, SnapshotError> {
    let path = snapshot_path(dir);
    if !path.exists() {
        debug!(target: "xreg::snapshot", path = %path.display(), "No snapshot found");
        return Ok(None);
    }
    let file = File::open(&path)?;
    let snapshot: StoreSnapshot = serde_json::from_reader(BufReader::new(file))?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    info!(
        target: "xreg::snapshot",
        path = %path.display(),
        commit_version = snapshot.commit_version,
        "Snapshot loaded"
    );
    Ok(Some(snapshot))
}
