//! Durable JSON backend for the ledger store
//!
//! The whole committed state is written to a temporary sibling file, flushed
//! to disk and renamed over the ledger file, so a crash mid-write leaves the
//! previous commit intact.

use super::state::LedgerState;
use crate::types::StoreError;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Location of a persisted ledger
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the committed state, or an empty ledger if the file is absent
    pub fn load(&self) -> Result<LedgerState, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "ledger file not found, starting empty");
                return Ok(LedgerState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut state: LedgerState = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        state.rebuild_indexes();
        debug!(path = %self.path.display(), bytes = bytes.len(), "ledger loaded");
        Ok(state)
    }

    /// Persist the state atomically
    pub fn save(&self, state: &LedgerState) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(state).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = self.tmp_path();
        let mut tmp = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_error(e))?;
        // the rename must never expose a file whose data is still in the page cache
        tmp.sync_all().map_err(|e| self.io_error(e))?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "ledger saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, error: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }
}
