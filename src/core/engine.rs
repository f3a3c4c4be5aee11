//! Ledger engine
//!
//! This module provides the `LedgerEngine`, which orchestrates every
//! financial operation by coordinating the store, the idempotency guard, the
//! receipt generator and the view cache.
//!
//! Each mutating operation follows the same pattern, implemented once in
//! [`LedgerEngine::execute`]:
//! 1. open one store transaction
//! 2. reserve the idempotency key inside it
//! 3. run the operation's balance checks and postings
//! 4. commit all of it, or none of it
//! 5. invalidate cached views touched by the commit
//!
//! The operations themselves live in sibling modules (`customers`,
//! `main_account`, `profit_sharing`, `admin_fee`, `reports`) as further
//! `impl LedgerEngine` blocks.

use super::cache::ViewCache;
use super::idempotency::{self, IdempotencyKey};
use super::posting::Posting;
use super::receipt::ReceiptGenerator;
use super::traits::{Clock, SystemClock};
use crate::config::LedgerPolicy;
use crate::store::LedgerStore;
use crate::types::{money, LedgerError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of a mutating operation
///
/// A reused idempotency key is not a failure: the earlier request already
/// committed, so the caller is told so and nothing is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution<T> {
    Applied(T),
    AlreadyProcessed,
}

impl<T> Execution<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Execution::Applied(value) => Some(value),
            Execution::AlreadyProcessed => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Execution::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Execution<U> {
        match self {
            Execution::Applied(value) => Execution::Applied(f(value)),
            Execution::AlreadyProcessed => Execution::AlreadyProcessed,
        }
    }
}

/// Cooperative ledger engine
///
/// Safe to share across threads; the store serializes writers.
#[derive(Debug)]
pub struct LedgerEngine {
    store: Arc<LedgerStore>,
    policy: LedgerPolicy,
    receipts: ReceiptGenerator,
    cache: ViewCache,
    clock: Arc<dyn Clock>,
}

impl LedgerEngine {
    /// Create an engine over `store` using wall-clock time
    pub fn new(store: Arc<LedgerStore>, policy: LedgerPolicy) -> Self {
        let receipts = ReceiptGenerator::new(
            policy.customer_receipt_digits,
            policy.main_receipt_digits,
            policy.receipt_max_attempts,
        );
        LedgerEngine {
            store,
            policy,
            receipts,
            cache: ViewCache::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Engine over a fresh in-memory store with default policy
    pub fn in_memory() -> Self {
        Self::new(Arc::new(LedgerStore::in_memory()), LedgerPolicy::default())
    }

    /// Replace the clock used to timestamp operations
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    pub(crate) fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Run one keyed operation as a single atomic transaction
    ///
    /// # Arguments
    ///
    /// * `operation` - Name used in log events
    /// * `key` - Caller-minted idempotency key, reserved inside the transaction
    /// * `work` - The operation's checks and postings
    ///
    /// # Returns
    ///
    /// * `Ok(Execution::Applied(value))` once everything committed
    /// * `Ok(Execution::AlreadyProcessed)` if the key was already used
    /// * `Err(LedgerError)` with nothing written otherwise
    pub(crate) fn execute<T, F>(
        &self,
        operation: &'static str,
        key: &IdempotencyKey,
        work: F,
    ) -> Result<Execution<T>, LedgerError>
    where
        F: FnOnce(&mut Posting<'_, '_>) -> Result<T, LedgerError>,
    {
        match self.commit(operation, Some(key), work) {
            Ok(value) => Ok(Execution::Applied(value)),
            Err(LedgerError::DuplicateExecution { key }) => {
                info!(operation, %key, "duplicate request ignored");
                Ok(Execution::AlreadyProcessed)
            }
            Err(e) => Err(e),
        }
    }

    /// Run an operation that carries no idempotency key
    ///
    /// Used for status changes and profile edits, which converge to the same
    /// state when repeated.
    pub(crate) fn execute_unkeyed<T, F>(&self, operation: &'static str, work: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Posting<'_, '_>) -> Result<T, LedgerError>,
    {
        self.commit(operation, None, work)
    }

    fn commit<T, F>(
        &self,
        operation: &'static str,
        key: Option<&IdempotencyKey>,
        work: F,
    ) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Posting<'_, '_>) -> Result<T, LedgerError>,
    {
        let receipts = self.receipts;

        let result = self.store.transaction(|tx| {
            if let Some(key) = key {
                idempotency::reserve(tx, key)?;
            }
            // read under the store lock so timestamps follow commit order
            let now = self.clock.now();
            let mut posting = Posting::new(tx, receipts, now);
            work(&mut posting)
        });

        match result {
            Ok((value, summary)) => {
                self.cache.invalidate(&summary);
                info!(
                    operation,
                    customers = summary.customers.len(),
                    customer_lines = summary.transactions_written,
                    main_lines = summary.main_account_transactions_written,
                    receipts = ?summary.receipts,
                    "operation committed"
                );
                Ok(value)
            }
            Err(e @ LedgerError::DuplicateExecution { .. }) => Err(e),
            Err(LedgerError::Store(store_error)) => {
                error!(operation, error = %store_error, "operation failed in the store");
                Err(LedgerError::Store(store_error))
            }
            Err(e) => {
                warn!(operation, error = %e, "operation refused");
                Err(e)
            }
        }
    }
}

/// Reject non-positive amounts and sub-unit precision
pub(crate) fn require_positive_amount(field: &str, amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid(field, "Jumlah harus lebih dari nol."));
    }
    if !money::has_money_precision(amount) {
        return Err(LedgerError::invalid(
            field,
            "Jumlah tidak boleh lebih dari dua angka desimal.",
        ));
    }
    Ok(())
}

/// Trim optional free text, mapping blank to `None`
pub(crate) fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty())
}
