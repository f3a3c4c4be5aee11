//! Balance-changing writes inside one ledger transaction
//!
//! Every money movement goes through [`Posting`]: it loads the affected
//! account, applies the signed amount with checked arithmetic, refuses to
//! take a balance below zero, stamps a unique receipt number and stages both
//! the updated balance and the ledger line. A balance and its lines can only
//! change together.

use super::receipt::{ReceiptGenerator, ReceiptPrefix};
use crate::store::StoreTx;
use crate::types::{
    Customer, CustomerId, EntryType, EventLink, LedgerError, MainAccount,
    MainAccountTransaction, PostingSource, Transaction, TransactionId,
};
use chrono::{DateTime, Utc};
use rand::rngs::ThreadRng;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A customer ledger line to post
#[derive(Debug, Clone)]
pub struct CustomerEntry {
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub event: Option<EventLink>,
    pub prefix: ReceiptPrefix,
}

impl CustomerEntry {
    pub fn credit(amount: Decimal, description: impl Into<String>, prefix: ReceiptPrefix) -> Self {
        CustomerEntry {
            entry_type: EntryType::Kredit,
            amount,
            description: description.into(),
            notes: None,
            event: None,
            prefix,
        }
    }

    pub fn debit(amount: Decimal, description: impl Into<String>, prefix: ReceiptPrefix) -> Self {
        CustomerEntry {
            entry_type: EntryType::Debit,
            amount,
            description: description.into(),
            notes: None,
            event: None,
            prefix,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn linked_to(mut self, event: EventLink) -> Self {
        self.event = Some(event);
        self
    }
}

/// A main-account ledger line to post
#[derive(Debug, Clone)]
pub struct MainEntry {
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub source: PostingSource,
    pub customer_transaction_id: Option<TransactionId>,
}

impl MainEntry {
    pub fn credit(amount: Decimal, description: impl Into<String>, source: PostingSource) -> Self {
        MainEntry {
            entry_type: EntryType::Kredit,
            amount,
            description: description.into(),
            notes: None,
            source,
            customer_transaction_id: None,
        }
    }

    pub fn debit(amount: Decimal, description: impl Into<String>, source: PostingSource) -> Self {
        MainEntry {
            entry_type: EntryType::Debit,
            amount,
            description: description.into(),
            notes: None,
            source,
            customer_transaction_id: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Mirror of a customer line (deposit/withdrawal)
    pub fn mirroring(mut self, customer_transaction: &Transaction) -> Self {
        self.customer_transaction_id = Some(customer_transaction.id);
        self
    }
}

/// Unit-of-work context handed to every engine operation
pub struct Posting<'t, 'a> {
    tx: &'t mut StoreTx<'a>,
    receipts: ReceiptGenerator,
    rng: ThreadRng,
    now: DateTime<Utc>,
}

impl<'t, 'a> Posting<'t, 'a> {
    pub(crate) fn new(tx: &'t mut StoreTx<'a>, receipts: ReceiptGenerator, now: DateTime<Utc>) -> Self {
        Posting {
            tx,
            receipts,
            rng: rand::thread_rng(),
            now,
        }
    }

    /// Timestamp shared by every row of this operation
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn store(&self) -> &StoreTx<'a> {
        &*self.tx
    }

    pub fn store_mut(&mut self) -> &mut StoreTx<'a> {
        &mut *self.tx
    }

    /// Current (staged or committed) state of a customer
    pub fn customer(&self, id: &CustomerId) -> Result<Customer, LedgerError> {
        self.tx
            .customer(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("Nasabah", id))
    }

    /// The main account, created with zero balance on first use
    pub fn main_account(&mut self) -> MainAccount {
        match self.tx.main_account() {
            Some(account) => account.clone(),
            None => {
                let account = MainAccount::new(self.now);
                self.tx.put_main_account(account.clone());
                account
            }
        }
    }

    pub fn main_balance(&self) -> Decimal {
        self.tx
            .main_account()
            .map(|account| account.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Stage a new or updated customer row
    pub fn save_customer(&mut self, mut customer: Customer) -> Result<Customer, LedgerError> {
        customer.updated_at = self.now;
        self.tx.put_customer(customer.clone())?;
        Ok(customer)
    }

    /// Apply `entry` to a customer balance and record the line
    ///
    /// # Errors
    ///
    /// - `NotFound` if the customer does not exist
    /// - `InsufficientFunds` if a debit exceeds the balance
    /// - `ArithmeticOverflow` if the balance cannot represent the result
    pub fn post_customer(
        &mut self,
        customer_id: &CustomerId,
        entry: CustomerEntry,
    ) -> Result<Transaction, LedgerError> {
        let mut customer = self.customer(customer_id)?;
        let before = customer.balance;
        customer.balance = apply_entry(before, entry.entry_type, entry.amount)
            .ok_or_else(|| LedgerError::overflow("saldo nasabah"))?;
        if customer.balance.is_sign_negative() {
            return Err(LedgerError::insufficient_customer_funds(before, entry.amount));
        }

        let receipt_number = self
            .receipts
            .customer_receipt(self.tx, &mut self.rng, entry.prefix)?;
        let line = Transaction {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            receipt_number,
            amount: entry.amount,
            entry_type: entry.entry_type,
            description: entry.description,
            notes: entry.notes,
            event: entry.event,
            created_at: self.now,
        };

        self.save_customer(customer)?;
        self.tx.insert_transaction(line.clone())?;
        Ok(line)
    }

    /// Apply `entry` to the main account and record the line
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` if a debit exceeds the operational float.
    pub fn post_main(&mut self, entry: MainEntry) -> Result<MainAccountTransaction, LedgerError> {
        let mut account = self.main_account();
        let before = account.balance;
        account.balance = apply_entry(before, entry.entry_type, entry.amount)
            .ok_or_else(|| LedgerError::overflow("saldo rekening induk"))?;
        if account.balance.is_sign_negative() {
            return Err(LedgerError::insufficient_main_funds(before, entry.amount));
        }
        account.updated_at = self.now;

        let receipt_number = self.receipts.main_receipt(self.tx, &mut self.rng)?;
        let line = MainAccountTransaction {
            id: Uuid::new_v4(),
            main_account_id: account.id,
            receipt_number,
            amount: entry.amount,
            entry_type: entry.entry_type,
            description: entry.description,
            notes: entry.notes,
            source: entry.source,
            customer_transaction_id: entry.customer_transaction_id,
            created_at: self.now,
        };

        self.tx.put_main_account(account);
        self.tx.insert_main_account_transaction(line.clone())?;
        Ok(line)
    }

    /// Fresh account number for a registration
    pub fn new_account_number(&mut self) -> Result<String, LedgerError> {
        Ok(self.receipts.account_number(self.tx, &mut self.rng, self.now)?)
    }
}

fn apply_entry(balance: Decimal, entry_type: EntryType, amount: Decimal) -> Option<Decimal> {
    match entry_type {
        EntryType::Kredit => balance.checked_add(amount),
        EntryType::Debit => balance.checked_sub(amount),
    }
}
