//! Ledger Store
//!
//! Relational-style storage for customers, both ledgers, events,
//! idempotency keys and daily snapshots, with one primitive for mutation:
//! [`LedgerStore::transaction`].
//!
//! # Isolation
//!
//! A transaction holds the store lock from its first read to its commit, so
//! every transaction sees a consistent state and no two transactions can
//! both pass a stale balance check. Writes are staged in a [`StoreTx`] and
//! applied only if the unit of work returns `Ok`; an error drops them all,
//! idempotency key included.
//!
//! Holding the lock for the whole unit of work is also why a distribution
//! over many customers blocks other writers for its duration.

mod file;
mod state;
mod tx;

pub use file::LedgerFile;
pub use state::{CommitSummary, LedgerState};
pub use tx::StoreTx;

use crate::types::StoreError;
use std::path::Path;
use std::sync::Mutex;
use tracing::error;

/// Transactional ledger storage, optionally backed by a file
#[derive(Debug)]
pub struct LedgerStore {
    state: Mutex<LedgerState>,
    file: Option<LedgerFile>,
}

impl LedgerStore {
    /// Create an empty store that lives only in memory
    pub fn in_memory() -> Self {
        LedgerStore {
            state: Mutex::new(LedgerState::default()),
            file: None,
        }
    }

    /// Open (or create) a store persisted at `path`
    ///
    /// Every commit rewrites the file before it becomes visible.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = LedgerFile::new(path.as_ref());
        let state = file.load()?;
        Ok(LedgerStore {
            state: Mutex::new(state),
            file: Some(file),
        })
    }

    /// Run `work` as one atomic transaction
    ///
    /// # Returns
    ///
    /// The value produced by `work` and a summary of what was committed.
    ///
    /// # Errors
    ///
    /// Any error from `work` aborts the transaction with nothing written.
    /// A failure to persist also aborts it: the in-memory state only
    /// advances after the file has been replaced.
    pub fn transaction<T, E, F>(&self, work: F) -> Result<(T, CommitSummary), E>
    where
        F: FnOnce(&mut StoreTx<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;

        let (value, writes) = {
            let mut tx = StoreTx::new(&guard);
            let value = work(&mut tx)?;
            (value, tx.into_writes())
        };

        if writes.is_empty() {
            return Ok((value, CommitSummary::default()));
        }

        let summary = match &self.file {
            None => guard.apply(writes),
            Some(file) => {
                let mut next = (*guard).clone();
                let summary = next.apply(writes);
                if let Err(e) = file.save(&next) {
                    error!(error = %e, "failed to persist ledger, transaction rolled back");
                    return Err(e.into());
                }
                *guard = next;
                summary
            }
        };

        Ok((value, summary))
    }

    /// Read the committed state
    pub fn read<T>(&self, reader: impl FnOnce(&LedgerState) -> T) -> Result<T, StoreError> {
        let guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(reader(&guard))
    }

    pub fn file(&self) -> Option<&LedgerFile> {
        self.file.as_ref()
    }
}
