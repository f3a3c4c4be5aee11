//! Transaction handle over the committed state
//!
//! A `StoreTx` reads through its own staged rows first and the committed
//! state second, so an operation always sees its own writes. Unique
//! constraints are checked against both layers when a row is staged.
//! Nothing reaches the committed state until the whole unit of work returns
//! `Ok`.

use super::state::{LedgerState, WriteSet};
use crate::types::{
    AdminFeeEvent, Customer, CustomerId, DailyBalanceSnapshot, MainAccount,
    MainAccountTransaction, ProfitSharingEvent, StoreError, Transaction,
};

/// Read/write view used inside one atomic transaction
pub struct StoreTx<'a> {
    base: &'a LedgerState,
    writes: WriteSet,
}

impl<'a> StoreTx<'a> {
    pub(crate) fn new(base: &'a LedgerState) -> Self {
        StoreTx {
            base,
            writes: WriteSet::default(),
        }
    }

    pub(crate) fn into_writes(self) -> WriteSet {
        self.writes
    }

    // --- customers ---

    pub fn customer(&self, id: &CustomerId) -> Option<&Customer> {
        self.writes
            .customers
            .get(id)
            .or_else(|| self.base.customer(id))
    }

    pub fn customer_by_account_number(&self, account_number: &str) -> Option<&Customer> {
        let id = self
            .writes
            .account_numbers
            .get(account_number)
            .copied()
            .or_else(|| {
                self.base
                    .customer_by_account_number(account_number)
                    .map(|customer| customer.id)
            })?;
        self.customer(&id)
            .filter(|customer| customer.account_number == account_number)
    }

    /// Owner of an identity number, seen through staged profile changes
    pub fn id_number_owner(&self, id_number: &str) -> Option<CustomerId> {
        let id = self.writes.id_numbers.get(id_number).copied().or_else(|| {
            self.base
                .customer_by_id_number(id_number)
                .map(|customer| customer.id)
        })?;
        self.customer(&id)
            .filter(|customer| customer.profile.id_number == id_number)
            .map(|customer| customer.id)
    }

    /// Every customer, staged versions replacing committed ones
    pub fn customers(&self) -> Vec<&Customer> {
        let mut customers: Vec<&Customer> = self
            .base
            .customers()
            .map(|customer| self.writes.customers.get(&customer.id).unwrap_or(customer))
            .collect();
        customers.extend(
            self.writes
                .customers
                .values()
                .filter(|customer| self.base.customer(&customer.id).is_none()),
        );
        customers
    }

    pub fn active_customers(&self) -> Vec<&Customer> {
        self.customers()
            .into_iter()
            .filter(|customer| customer.is_active())
            .collect()
    }

    /// Stage an insert or update of a customer row
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if another customer already holds the account
    /// number or identity number.
    pub fn put_customer(&mut self, customer: Customer) -> Result<(), StoreError> {
        if let Some(owner) = self
            .customer_by_account_number(&customer.account_number)
            .map(|existing| existing.id)
        {
            if owner != customer.id {
                return Err(StoreError::UniqueViolation {
                    constraint: "customer.account_number",
                    value: customer.account_number,
                });
            }
        }
        if let Some(owner) = self.id_number_owner(&customer.profile.id_number) {
            if owner != customer.id {
                return Err(StoreError::UniqueViolation {
                    constraint: "customer.id_number",
                    value: customer.profile.id_number,
                });
            }
        }

        if let Some(previous) = self.writes.customers.get(&customer.id) {
            if previous.profile.id_number != customer.profile.id_number {
                self.writes.id_numbers.remove(&previous.profile.id_number);
            }
        }
        self.writes
            .account_numbers
            .insert(customer.account_number.clone(), customer.id);
        self.writes
            .id_numbers
            .insert(customer.profile.id_number.clone(), customer.id);
        self.writes.customers.insert(customer.id, customer);
        Ok(())
    }

    // --- main account ---

    pub fn main_account(&self) -> Option<&MainAccount> {
        self.writes
            .main_account
            .as_ref()
            .or_else(|| self.base.main_account())
    }

    pub fn put_main_account(&mut self, account: MainAccount) {
        self.writes.main_account = Some(account);
    }

    // --- idempotency keys ---

    pub fn has_idempotency_key(&self, key: &str) -> bool {
        self.writes.idempotency_keys.contains(key) || self.base.has_idempotency_key(key)
    }

    pub fn insert_idempotency_key(&mut self, key: &str) -> Result<(), StoreError> {
        if self.has_idempotency_key(key) {
            return Err(StoreError::UniqueViolation {
                constraint: "idempotency_key.id",
                value: key.to_string(),
            });
        }
        self.writes.idempotency_keys.insert(key.to_string());
        Ok(())
    }

    // --- ledger lines ---

    pub fn transaction_receipt_exists(&self, receipt_number: &str) -> bool {
        self.writes.transaction_receipts.contains(receipt_number)
            || self.base.transaction_by_receipt(receipt_number).is_some()
    }

    pub fn main_transaction_receipt_exists(&self, receipt_number: &str) -> bool {
        self.writes.main_transaction_receipts.contains(receipt_number)
            || self
                .base
                .main_account_transaction_by_receipt(receipt_number)
                .is_some()
    }

    fn check_receipt(&self, receipt_number: &str) -> Result<(), StoreError> {
        if self.transaction_receipt_exists(receipt_number)
            || self.main_transaction_receipt_exists(receipt_number)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "receipt_number",
                value: receipt_number.to_string(),
            });
        }
        Ok(())
    }

    /// Stage a customer ledger line
    ///
    /// The owning customer must exist and the receipt number must be unused
    /// in both ledgers.
    pub fn insert_transaction(&mut self, tx: Transaction) -> Result<(), StoreError> {
        if self.customer(&tx.customer_id).is_none() {
            return Err(StoreError::MissingRow(format!("customer {}", tx.customer_id)));
        }
        self.check_receipt(&tx.receipt_number)?;
        self.writes
            .transaction_receipts
            .insert(tx.receipt_number.clone());
        self.writes.transactions.push(tx);
        Ok(())
    }

    /// Stage many customer ledger lines at once
    pub fn insert_transactions(
        &mut self,
        txs: impl IntoIterator<Item = Transaction>,
    ) -> Result<(), StoreError> {
        for tx in txs {
            self.insert_transaction(tx)?;
        }
        Ok(())
    }

    pub fn insert_main_account_transaction(
        &mut self,
        tx: MainAccountTransaction,
    ) -> Result<(), StoreError> {
        if self.main_account().map(|account| account.id) != Some(tx.main_account_id) {
            return Err(StoreError::MissingRow(format!(
                "main account {}",
                tx.main_account_id
            )));
        }
        self.check_receipt(&tx.receipt_number)?;
        self.writes
            .main_transaction_receipts
            .insert(tx.receipt_number.clone());
        self.writes.main_account_transactions.push(tx);
        Ok(())
    }

    // --- events and snapshots ---

    pub fn insert_profit_sharing_event(&mut self, event: ProfitSharingEvent) {
        self.writes.profit_sharing_events.push(event);
    }

    pub fn insert_admin_fee_event(&mut self, event: AdminFeeEvent) {
        self.writes.admin_fee_events.push(event);
    }

    /// Stage a snapshot, replacing any committed one for the same date
    pub fn put_daily_snapshot(&mut self, snapshot: DailyBalanceSnapshot) {
        self.writes
            .daily_balance_snapshots
            .retain(|existing| existing.date != snapshot.date);
        self.writes.daily_balance_snapshots.push(snapshot);
    }
}
