//! Committed ledger tables
//!
//! `LedgerState` holds every committed row plus the unique indexes the
//! store enforces (account number, id number, receipt numbers, idempotency
//! keys). Rows only enter it through [`LedgerState::apply`], which takes the
//! write-set of a finished transaction.

use crate::types::{
    AdminFeeEvent, Customer, CustomerId, DailyBalanceSnapshot, EventId, MainAccount,
    MainAccountTransaction, ProfitSharingEvent, Transaction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// All committed rows of the ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    customers: BTreeMap<CustomerId, Customer>,
    main_account: Option<MainAccount>,
    transactions: Vec<Transaction>,
    main_account_transactions: Vec<MainAccountTransaction>,
    profit_sharing_events: Vec<ProfitSharingEvent>,
    admin_fee_events: Vec<AdminFeeEvent>,
    idempotency_keys: BTreeSet<String>,
    daily_balance_snapshots: Vec<DailyBalanceSnapshot>,

    #[serde(skip)]
    indexes: Indexes,
}

/// Lookup indexes derived from the tables, rebuilt on load
#[derive(Debug, Clone, Default)]
struct Indexes {
    account_numbers: HashMap<String, CustomerId>,
    id_numbers: HashMap<String, CustomerId>,
    transaction_receipts: HashMap<String, usize>,
    main_transaction_receipts: HashMap<String, usize>,
}

/// Rows staged by one transaction, applied together on commit
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    pub(crate) customers: BTreeMap<CustomerId, Customer>,
    pub(crate) main_account: Option<MainAccount>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) main_account_transactions: Vec<MainAccountTransaction>,
    pub(crate) profit_sharing_events: Vec<ProfitSharingEvent>,
    pub(crate) admin_fee_events: Vec<AdminFeeEvent>,
    pub(crate) idempotency_keys: BTreeSet<String>,
    pub(crate) daily_balance_snapshots: Vec<DailyBalanceSnapshot>,

    pub(crate) account_numbers: HashMap<String, CustomerId>,
    pub(crate) id_numbers: HashMap<String, CustomerId>,
    pub(crate) transaction_receipts: HashSet<String>,
    pub(crate) main_transaction_receipts: HashSet<String>,
}

impl WriteSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.customers.is_empty()
            && self.main_account.is_none()
            && self.transactions.is_empty()
            && self.main_account_transactions.is_empty()
            && self.profit_sharing_events.is_empty()
            && self.admin_fee_events.is_empty()
            && self.idempotency_keys.is_empty()
            && self.daily_balance_snapshots.is_empty()
    }
}

/// What a committed transaction touched
///
/// Handed to the view cache so stale entries can be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub customers: Vec<CustomerId>,
    pub main_account_changed: bool,
    pub transactions_written: usize,
    pub main_account_transactions_written: usize,

    /// Receipt numbers of every line written, customer lines first
    pub receipts: Vec<String>,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
            && !self.main_account_changed
            && self.transactions_written == 0
            && self.main_account_transactions_written == 0
    }
}

impl LedgerState {
    pub fn customer(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.get(id)
    }

    pub fn customer_by_account_number(&self, account_number: &str) -> Option<&Customer> {
        self.indexes
            .account_numbers
            .get(account_number)
            .and_then(|id| self.customers.get(id))
    }

    pub fn customer_by_id_number(&self, id_number: &str) -> Option<&Customer> {
        self.indexes
            .id_numbers
            .get(id_number)
            .and_then(|id| self.customers.get(id))
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn main_account(&self) -> Option<&MainAccount> {
        self.main_account.as_ref()
    }

    /// Customer ledger lines in commit order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Operational ledger lines in commit order
    pub fn main_account_transactions(&self) -> &[MainAccountTransaction] {
        &self.main_account_transactions
    }

    pub fn transaction_by_receipt(&self, receipt_number: &str) -> Option<&Transaction> {
        self.indexes
            .transaction_receipts
            .get(receipt_number)
            .map(|&index| &self.transactions[index])
    }

    pub fn main_account_transaction_by_receipt(
        &self,
        receipt_number: &str,
    ) -> Option<&MainAccountTransaction> {
        self.indexes
            .main_transaction_receipts
            .get(receipt_number)
            .map(|&index| &self.main_account_transactions[index])
    }

    pub fn profit_sharing_events(&self) -> &[ProfitSharingEvent] {
        &self.profit_sharing_events
    }

    pub fn profit_sharing_event(&self, id: &EventId) -> Option<&ProfitSharingEvent> {
        self.profit_sharing_events.iter().find(|event| event.id == *id)
    }

    pub fn admin_fee_events(&self) -> &[AdminFeeEvent] {
        &self.admin_fee_events
    }

    pub fn admin_fee_event(&self, id: &EventId) -> Option<&AdminFeeEvent> {
        self.admin_fee_events.iter().find(|event| event.id == *id)
    }

    pub fn has_idempotency_key(&self, key: &str) -> bool {
        self.idempotency_keys.contains(key)
    }

    /// Snapshots ordered by date
    pub fn daily_balance_snapshots(&self) -> &[DailyBalanceSnapshot] {
        &self.daily_balance_snapshots
    }

    /// Rebuild the lookup indexes from the tables
    ///
    /// Needed after deserializing, since indexes are not persisted.
    pub fn rebuild_indexes(&mut self) {
        let mut indexes = Indexes::default();
        for customer in self.customers.values() {
            indexes
                .account_numbers
                .insert(customer.account_number.clone(), customer.id);
            indexes
                .id_numbers
                .insert(customer.profile.id_number.clone(), customer.id);
        }
        for (index, tx) in self.transactions.iter().enumerate() {
            indexes
                .transaction_receipts
                .insert(tx.receipt_number.clone(), index);
        }
        for (index, tx) in self.main_account_transactions.iter().enumerate() {
            indexes
                .main_transaction_receipts
                .insert(tx.receipt_number.clone(), index);
        }
        self.indexes = indexes;
    }

    /// Apply a validated write-set
    ///
    /// Uniqueness was checked while the write-set was staged under the same
    /// lock, so applying cannot fail.
    pub(crate) fn apply(&mut self, writes: WriteSet) -> CommitSummary {
        let summary = CommitSummary {
            customers: writes.customers.keys().copied().collect(),
            main_account_changed: writes.main_account.is_some(),
            transactions_written: writes.transactions.len(),
            main_account_transactions_written: writes.main_account_transactions.len(),
            receipts: writes
                .transactions
                .iter()
                .map(|tx| tx.receipt_number.clone())
                .chain(
                    writes
                        .main_account_transactions
                        .iter()
                        .map(|tx| tx.receipt_number.clone()),
                )
                .collect(),
        };

        for (id, customer) in writes.customers {
            if let Some(previous) = self.customers.get(&id) {
                remove_if_owned(&mut self.indexes.account_numbers, &previous.account_number, id);
                remove_if_owned(&mut self.indexes.id_numbers, &previous.profile.id_number, id);
            }
            self.indexes
                .account_numbers
                .insert(customer.account_number.clone(), id);
            self.indexes
                .id_numbers
                .insert(customer.profile.id_number.clone(), id);
            self.customers.insert(id, customer);
        }

        if let Some(main_account) = writes.main_account {
            self.main_account = Some(main_account);
        }

        for tx in writes.transactions {
            self.indexes
                .transaction_receipts
                .insert(tx.receipt_number.clone(), self.transactions.len());
            self.transactions.push(tx);
        }

        for tx in writes.main_account_transactions {
            self.indexes
                .main_transaction_receipts
                .insert(tx.receipt_number.clone(), self.main_account_transactions.len());
            self.main_account_transactions.push(tx);
        }

        self.profit_sharing_events.extend(writes.profit_sharing_events);
        self.admin_fee_events.extend(writes.admin_fee_events);
        self.idempotency_keys.extend(writes.idempotency_keys);

        for snapshot in writes.daily_balance_snapshots {
            match self
                .daily_balance_snapshots
                .binary_search_by_key(&snapshot.date, |existing| existing.date)
            {
                Ok(index) => self.daily_balance_snapshots[index] = snapshot,
                Err(index) => self.daily_balance_snapshots.insert(index, snapshot),
            }
        }

        summary
    }
}

fn remove_if_owned(index: &mut HashMap<String, CustomerId>, key: &str, owner: CustomerId) {
    if index.get(key) == Some(&owner) {
        index.remove(key);
    }
}
