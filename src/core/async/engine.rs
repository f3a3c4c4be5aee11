//! Async facade over the ledger engine
//!
//! This module provides `AsyncLedgerEngine`, which lets async request
//! handlers call the synchronous [`LedgerEngine`] without blocking the
//! runtime. Every call runs on tokio's blocking pool.
//!
//! # Architecture
//!
//! ```text
//! AsyncLedgerEngine
//!     └── Arc<LedgerEngine>
//!             └── Arc<LedgerStore>  (one lock, one transaction at a time)
//! ```
//!
//! # Thread Safety
//!
//! The facade is cloneable and can be shared across tasks. It adds no locks
//! of its own: concurrent requests are serialized by the store's transaction
//! boundary, so two withdrawals against one customer can never both pass a
//! stale balance check.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::admin_fee::AdminFeeCollection;
use crate::core::customers::{CashMovement, TransferReceipt};
use crate::core::engine::{Execution, LedgerEngine};
use crate::core::idempotency::IdempotencyKey;
use crate::core::main_account::MainAccountMovement;
use crate::types::{CustomerId, CustomerProfile, LedgerError, ProfitSharingEvent, StoreError};

/// Cloneable async handle to a shared [`LedgerEngine`]
#[derive(Debug, Clone)]
pub struct AsyncLedgerEngine {
    /// Shared synchronous engine
    engine: Arc<LedgerEngine>,
}

impl AsyncLedgerEngine {
    /// Wrap an engine for use from async code
    ///
    /// # Arguments
    ///
    /// * `engine` - Arc-wrapped engine, possibly shared with sync callers
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    /// The wrapped synchronous engine
    pub fn engine(&self) -> &Arc<LedgerEngine> {
        &self.engine
    }

    /// Run `operation` against the engine on the blocking pool
    ///
    /// # Errors
    ///
    /// Whatever `operation` returns, or `StoreError::Task` if the blocking
    /// task panicked or was cancelled.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&LedgerEngine) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || operation(&engine))
            .await
            .map_err(|e| LedgerError::Store(StoreError::Task(e.to_string())))?
    }

    pub async fn register_customer(
        &self,
        key: IdempotencyKey,
        profile: CustomerProfile,
        initial_balance: Decimal,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        self.run(move |engine| engine.register_customer(&key, profile, initial_balance))
            .await
    }

    pub async fn deposit(
        &self,
        key: IdempotencyKey,
        customer_id: CustomerId,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        self.run(move |engine| engine.deposit(&key, &customer_id, amount, notes))
            .await
    }

    pub async fn withdraw(
        &self,
        key: IdempotencyKey,
        customer_id: CustomerId,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        self.run(move |engine| engine.withdraw(&key, &customer_id, amount, notes))
            .await
    }

    pub async fn transfer(
        &self,
        key: IdempotencyKey,
        source_id: CustomerId,
        destination_account_number: String,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<TransferReceipt>, LedgerError> {
        self.run(move |engine| {
            engine.transfer(&key, &source_id, &destination_account_number, amount, notes)
        })
        .await
    }

    pub async fn top_up_main(
        &self,
        key: IdempotencyKey,
        amount: Decimal,
        description: String,
        notes: Option<String>,
    ) -> Result<Execution<MainAccountMovement>, LedgerError> {
        self.run(move |engine| engine.top_up_main(&key, amount, description, notes))
            .await
    }

    pub async fn withdraw_main(
        &self,
        key: IdempotencyKey,
        amount: Decimal,
        description: String,
        notes: Option<String>,
    ) -> Result<Execution<MainAccountMovement>, LedgerError> {
        self.run(move |engine| engine.withdraw_main(&key, amount, description, notes))
            .await
    }

    pub async fn execute_profit_sharing(
        &self,
        key: IdempotencyKey,
        total_amount: Decimal,
    ) -> Result<Execution<ProfitSharingEvent>, LedgerError> {
        self.run(move |engine| engine.execute_profit_sharing(&key, total_amount))
            .await
    }

    pub async fn execute_admin_fee(
        &self,
        key: IdempotencyKey,
        amount_per_customer: Decimal,
        description: String,
    ) -> Result<Execution<AdminFeeCollection>, LedgerError> {
        self.run(move |engine| engine.execute_admin_fee(&key, amount_per_customer, description))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use chrono::NaiveDate;
    use futures::future::join_all;

    fn profile(n: u32) -> CustomerProfile {
        CustomerProfile {
            name: format!("Peserta {}", n),
            id_number: format!("36010000000{:05}", n),
            address: "Jl. Veteran No. 45, Makassar".to_string(),
            phone: "081211223344".to_string(),
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(1985, 12, 12).unwrap(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let facade = AsyncLedgerEngine::new(Arc::new(LedgerEngine::in_memory()));
        let customer = facade
            .register_customer(IdempotencyKey::generate(), profile(1), Decimal::new(100_000, 0))
            .await
            .unwrap()
            .applied()
            .unwrap()
            .customer;

        let attempts = (0..10).map(|_| {
            facade.withdraw(
                IdempotencyKey::generate(),
                customer.id,
                Decimal::new(30_000, 0),
                None,
            )
        });
        let results = join_all(attempts).await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 3);
        let balance = facade.engine().customer(&customer.id).unwrap().balance;
        assert_eq!(balance, Decimal::new(10_000, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_retries_with_one_key_apply_once() {
        let facade = AsyncLedgerEngine::new(Arc::new(LedgerEngine::in_memory()));
        let customer = facade
            .register_customer(IdempotencyKey::generate(), profile(2), Decimal::new(50_000, 0))
            .await
            .unwrap()
            .applied()
            .unwrap()
            .customer;

        let key = IdempotencyKey::generate();
        let retries = (0..8).map(|_| facade.deposit(key, customer.id, Decimal::new(1_000, 0), None));
        let results = join_all(retries).await;

        let applied = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|execution| execution.is_applied())
            .count();
        assert_eq!(applied, 1);
        assert_eq!(
            facade.engine().customer(&customer.id).unwrap().balance,
            Decimal::new(51_000, 0)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_main_withdrawals_never_overdraw() {
        let facade = AsyncLedgerEngine::new(Arc::new(LedgerEngine::in_memory()));
        facade
            .top_up_main(
                IdempotencyKey::generate(),
                Decimal::new(100_000, 0),
                "Modal awal".to_string(),
                None,
            )
            .await
            .unwrap();

        let attempts = (0..10).map(|_| {
            facade.withdraw_main(
                IdempotencyKey::generate(),
                Decimal::new(30_000, 0),
                "Belanja operasional".to_string(),
                None,
            )
        });
        let results = join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::InsufficientFunds { .. })));
        assert_eq!(facade.engine().main_balance().unwrap(), Decimal::new(10_000, 0));
    }
}
