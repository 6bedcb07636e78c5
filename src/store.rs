use std::fs;
use std::path::{Path, PathBuf};

use tracing::error;

use crate::data::Snapshot;
use crate::error::LedgerResult;

/// JSON snapshot store over a single file. Every save replaces the full
/// snapshot; there is no incremental persistence.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last-saved snapshot. A missing, unreadable or corrupt file
    /// falls back to the default empty snapshot; corruption is reported but
    /// never halts startup.
    pub fn load(&self) -> Snapshot {
        if !self.path.exists() {
            return Snapshot::default();
        }

        match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(
                    "Error loading portfolio data from {}, starting from defaults: {}",
                    self.path.display(),
                    e
                );
                Snapshot::default()
            }
        }
    }

    fn read_snapshot(&self) -> LedgerResult<Snapshot> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, snapshot: &Snapshot) -> LedgerResult<()> {
        let raw = serde_json::to_string_pretty(snapshot)?;

        // Write-then-rename so a failed save never clobbers the last good file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
