//! Main account (rekening induk) operations
//!
//! Manual top-up and withdrawal of the operational float, the balance read,
//! and the snapshot writer used by the daily batch.

use super::engine::{clean_notes, require_positive_amount, Execution, LedgerEngine};
use super::idempotency::IdempotencyKey;
use super::posting::MainEntry;
use crate::types::{
    DailyBalanceSnapshot, LedgerError, MainAccount, MainAccountTransaction, PostingSource,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

const MIN_DESCRIPTION_CHARS: usize = 3;

/// A manual posting and the resulting main-account state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainAccountMovement {
    pub account: MainAccount,
    pub transaction: MainAccountTransaction,
}

fn require_description(description: &str) -> Result<String, LedgerError> {
    let description = description.trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(LedgerError::invalid("description", "Deskripsi wajib diisi."));
    }
    Ok(description.to_string())
}

impl LedgerEngine {
    /// Add operational cash to the main account
    pub fn top_up_main(
        &self,
        key: &IdempotencyKey,
        amount: Decimal,
        description: String,
        notes: Option<String>,
    ) -> Result<Execution<MainAccountMovement>, LedgerError> {
        require_positive_amount("amount", amount)?;
        let description = require_description(&description)?;
        let notes = clean_notes(notes);

        self.execute("top_up_main", key, |posting| {
            let transaction = posting.post_main(
                MainEntry::credit(amount, description, PostingSource::ManualOperational)
                    .with_notes(notes),
            )?;
            Ok(MainAccountMovement {
                account: posting.main_account(),
                transaction,
            })
        })
    }

    /// Take operational cash out of the main account
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` if the balance is below `amount`.
    pub fn withdraw_main(
        &self,
        key: &IdempotencyKey,
        amount: Decimal,
        description: String,
        notes: Option<String>,
    ) -> Result<Execution<MainAccountMovement>, LedgerError> {
        require_positive_amount("amount", amount)?;
        let description = require_description(&description)?;
        let notes = clean_notes(notes);

        self.execute("withdraw_main", key, |posting| {
            let transaction = posting.post_main(
                MainEntry::debit(amount, description, PostingSource::ManualOperational)
                    .with_notes(notes),
            )?;
            Ok(MainAccountMovement {
                account: posting.main_account(),
                transaction,
            })
        })
    }

    /// The main account row, zero-balanced if nothing was ever posted
    pub fn main_account(&self) -> Result<MainAccount, LedgerError> {
        let now = self.clock().now();
        Ok(self.store().read(|state| {
            state
                .main_account()
                .cloned()
                .unwrap_or_else(|| MainAccount::new(now))
        })?)
    }

    /// Current main-account balance, served from the view cache when possible
    pub fn main_balance(&self) -> Result<Decimal, LedgerError> {
        if let Some(balance) = self.cache().main_balance() {
            return Ok(balance);
        }
        let cache = self.cache();
        Ok(self.store().read(|state| {
            let balance = state
                .main_account()
                .map(|account| account.balance)
                .unwrap_or(Decimal::ZERO);
            cache.store_main_balance(balance);
            balance
        })?)
    }

    /// Materialize the current main balance as the snapshot for `date`
    ///
    /// Replaces an existing snapshot for the same date.
    pub fn record_daily_snapshot(&self, date: NaiveDate) -> Result<DailyBalanceSnapshot, LedgerError> {
        self.execute_unkeyed("record_daily_snapshot", |posting| {
            let snapshot = DailyBalanceSnapshot {
                date,
                balance: posting.main_balance(),
            };
            posting.store_mut().put_daily_snapshot(snapshot.clone());
            Ok(snapshot)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryType, MAIN_ACCOUNT_ID};

    #[test]
    fn test_top_up_then_withdraw() {
        let engine = LedgerEngine::in_memory();

        let top_up = engine
            .top_up_main(
                &IdempotencyKey::generate(),
                Decimal::new(1_000_000, 0),
                "Modal awal".to_string(),
                Some("dari pengurus".to_string()),
            )
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(top_up.account.id, MAIN_ACCOUNT_ID);
        assert_eq!(top_up.account.balance, Decimal::new(1_000_000, 0));
        assert_eq!(top_up.transaction.entry_type, EntryType::Kredit);
        assert_eq!(top_up.transaction.source, PostingSource::ManualOperational);
        assert!(top_up.transaction.receipt_number.starts_with("IK"));
        assert_eq!(top_up.transaction.receipt_number.len(), 7);

        let withdrawal = engine
            .withdraw_main(
                &IdempotencyKey::generate(),
                Decimal::new(400_000, 0),
                "Sewa kantor".to_string(),
                None,
            )
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(withdrawal.account.balance, Decimal::new(600_000, 0));
        assert_eq!(engine.main_balance().unwrap(), Decimal::new(600_000, 0));
    }

    #[test]
    fn test_withdraw_main_insufficient() {
        let engine = LedgerEngine::in_memory();
        let err = engine
            .withdraw_main(
                &IdempotencyKey::generate(),
                Decimal::new(1, 0),
                "Sewa kantor".to_string(),
                None,
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::insufficient_main_funds(Decimal::ZERO, Decimal::ONE));
        assert!(engine.store().read(|state| state.main_account().is_none()).unwrap());
    }

    #[test]
    fn test_description_required() {
        let engine = LedgerEngine::in_memory();
        let err = engine
            .top_up_main(&IdempotencyKey::generate(), Decimal::ONE, "  a ".to_string(), None)
            .unwrap_err();
        assert_eq!(err, LedgerError::invalid("description", "Deskripsi wajib diisi."));
    }

    #[test]
    fn test_duplicate_top_up_applies_once() {
        let engine = LedgerEngine::in_memory();
        let key = IdempotencyKey::generate();

        let first = engine
            .top_up_main(&key, Decimal::new(10_000, 0), "Modal".to_string(), None)
            .unwrap();
        let second = engine
            .top_up_main(&key, Decimal::new(10_000, 0), "Modal".to_string(), None)
            .unwrap();

        assert!(first.is_applied());
        assert_eq!(second, Execution::AlreadyProcessed);
        assert_eq!(engine.main_balance().unwrap(), Decimal::new(10_000, 0));
    }

    #[test]
    fn test_snapshot_upserts_by_date() {
        let engine = LedgerEngine::in_memory();
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        engine.record_daily_snapshot(date).unwrap();
        engine
            .top_up_main(&IdempotencyKey::generate(), Decimal::new(500, 0), "Modal".to_string(), None)
            .unwrap();
        let snapshot = engine.record_daily_snapshot(date).unwrap();

        assert_eq!(snapshot.balance, Decimal::new(500, 0));
        let stored = engine
            .store()
            .read(|state| state.daily_balance_snapshots().to_vec())
            .unwrap();
        assert_eq!(stored, vec![snapshot]);
    }
}
