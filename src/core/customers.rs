//! Customer account operations
//!
//! Registration, profile edits, cash deposit and withdrawal, transfers
//! between customers, the ACTIVE/INACTIVE lifecycle and the
//! transfer-destination search.
//!
//! Deposits and withdrawals move physical cash, so each one posts a mirror
//! line on the main account in the same transaction. Transfers keep the money
//! inside customer ledgers and leave the main account untouched.

use super::cache::CustomerSummary;
use super::engine::{clean_notes, require_positive_amount, Execution, LedgerEngine};
use super::idempotency::IdempotencyKey;
use super::posting::{CustomerEntry, MainEntry, Posting};
use super::receipt::ReceiptPrefix;
use crate::types::{
    Customer, CustomerId, CustomerProfile, CustomerStatus, EntryType, FieldErrors, LedgerError,
    MainAccountTransaction, PostingSource, Transaction,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub const DEPOSIT_DESCRIPTION: &str = "SIMPAN TUNAI";
pub const WITHDRAWAL_DESCRIPTION: &str = "TARIK TUNAI";
pub const OPENING_DEPOSIT_DESCRIPTION: &str = "SETORAN AWAL";
pub const WRITE_OFF_DESCRIPTION: &str = "PENGHAPUSAN SALDO SISA";

const ID_NUMBER_LENGTH: usize = 16;
const MIN_NAME_CHARS: usize = 3;
const MIN_ADDRESS_CHARS: usize = 10;
const MIN_PHONE_DIGITS: usize = 10;

/// A customer cash movement and its main-account mirror
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub customer: Customer,
    pub transaction: Transaction,
    pub main_transaction: MainAccountTransaction,
}

/// Both legs of a transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub source: Customer,
    pub destination: Customer,
    pub debit: Transaction,
    pub credit: Transaction,
}

/// Result of a deactivation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deactivation {
    pub customer: Customer,

    /// Line recording a sub-unit balance zeroed by the deactivation
    pub written_off: Option<Transaction>,
}

/// Check the editable profile fields
///
/// Collects every failing field rather than stopping at the first one.
pub fn validate_profile(profile: &CustomerProfile, today: NaiveDate) -> Result<(), LedgerError> {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &str, message: &str| {
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    };

    if profile.name.trim().chars().count() < MIN_NAME_CHARS {
        fail("name", "Nama harus terdiri dari minimal 3 karakter.");
    }
    if profile.id_number.len() != ID_NUMBER_LENGTH
        || !profile.id_number.chars().all(|c| c.is_ascii_digit())
    {
        fail("idNumber", "Nomor KTP harus terdiri dari 16 digit.");
    }
    if profile.address.trim().chars().count() < MIN_ADDRESS_CHARS {
        fail("address", "Alamat harus terdiri dari minimal 10 karakter.");
    }
    let phone_digits = profile.phone.chars().filter(|c| c.is_ascii_digit()).count();
    let phone_shape = profile
        .phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'));
    if phone_digits < MIN_PHONE_DIGITS || !phone_shape {
        fail("phone", "Nomor telepon harus terdiri dari minimal 10 digit.");
    }
    if profile.birth_date > today {
        fail("birthDate", "Tanggal lahir tidak boleh di masa depan.");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(errors))
    }
}

fn require_active(customer: &Customer) -> Result<(), LedgerError> {
    if customer.is_active() {
        Ok(())
    } else {
        Err(LedgerError::CustomerInactive {
            name: customer.name().to_string(),
        })
    }
}

fn require_unique_id_number(
    posting: &Posting<'_, '_>,
    profile: &CustomerProfile,
    owner: Option<CustomerId>,
) -> Result<(), LedgerError> {
    match posting.store().id_number_owner(&profile.id_number) {
        Some(existing) if Some(existing) != owner => Err(LedgerError::invalid(
            "idNumber",
            "Nomor KTP sudah terdaftar.",
        )),
        _ => Ok(()),
    }
}

impl LedgerEngine {
    /// Register a customer and post the opening balance as a cash deposit
    ///
    /// The opening balance must be at least the policy minimum. It is
    /// recorded exactly like a deposit: a customer KREDIT line plus a
    /// main-account KREDIT mirror.
    pub fn register_customer(
        &self,
        key: &IdempotencyKey,
        profile: CustomerProfile,
        initial_balance: Decimal,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        validate_profile(&profile, self.clock().now().date_naive())?;
        require_positive_amount("initialBalance", initial_balance)?;
        if initial_balance < self.policy().minimum_initial_balance {
            return Err(LedgerError::invalid(
                "initialBalance",
                format!(
                    "Setoran awal minimal {}.",
                    self.policy().minimum_initial_balance
                ),
            ));
        }

        self.execute("register_customer", key, |posting| {
            require_unique_id_number(posting, &profile, None)?;
            let account_number = posting.new_account_number()?;
            let customer = Customer::new(Uuid::new_v4(), profile, account_number, posting.now());
            let customer_id = customer.id;
            posting.save_customer(customer)?;

            post_cash(
                posting,
                &customer_id,
                EntryType::Kredit,
                initial_balance,
                OPENING_DEPOSIT_DESCRIPTION,
                None,
            )
        })
    }

    /// Replace the profile fields of a customer
    ///
    /// Balance, status and account number are never touched here.
    pub fn update_customer_profile(
        &self,
        customer_id: &CustomerId,
        profile: CustomerProfile,
    ) -> Result<Customer, LedgerError> {
        validate_profile(&profile, self.clock().now().date_naive())?;

        self.execute_unkeyed("update_customer_profile", |posting| {
            let mut customer = posting.customer(customer_id)?;
            require_unique_id_number(posting, &profile, Some(customer.id))?;
            customer.profile = profile;
            posting.save_customer(customer)
        })
    }

    /// Cash deposit into a customer account
    ///
    /// # Errors
    ///
    /// - `Validation` if the amount is not positive
    /// - `NotFound` / `CustomerInactive` for an unknown or inactive customer
    pub fn deposit(
        &self,
        key: &IdempotencyKey,
        customer_id: &CustomerId,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        require_positive_amount("amount", amount)?;
        let notes = clean_notes(notes);

        self.execute("deposit", key, |posting| {
            require_active(&posting.customer(customer_id)?)?;
            post_cash(
                posting,
                customer_id,
                EntryType::Kredit,
                amount,
                DEPOSIT_DESCRIPTION,
                notes,
            )
        })
    }

    /// Cash withdrawal from a customer account
    ///
    /// The operational float is checked before the customer balance: cash
    /// cannot be paid out if the cooperative does not hold it.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` (main account) if the float cannot cover it
    /// - `InsufficientFunds` (customer) if the balance cannot cover it
    pub fn withdraw(
        &self,
        key: &IdempotencyKey,
        customer_id: &CustomerId,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<CashMovement>, LedgerError> {
        require_positive_amount("amount", amount)?;
        let notes = clean_notes(notes);

        self.execute("withdraw", key, |posting| {
            let main_balance = posting.main_balance();
            if main_balance < amount {
                return Err(LedgerError::insufficient_main_funds(main_balance, amount));
            }
            let customer = posting.customer(customer_id)?;
            require_active(&customer)?;
            if customer.balance < amount {
                return Err(LedgerError::insufficient_customer_funds(customer.balance, amount));
            }

            post_cash(
                posting,
                customer_id,
                EntryType::Debit,
                amount,
                WITHDRAWAL_DESCRIPTION,
                notes,
            )
        })
    }

    /// Move money from one customer to another by account number
    ///
    /// # Errors
    ///
    /// - `NotFound` if either party is unknown
    /// - `SelfTransfer` if both are the same account
    /// - `TransferPartyInactive` if either party is INACTIVE
    /// - `InsufficientFunds` if the source balance is too low
    pub fn transfer(
        &self,
        key: &IdempotencyKey,
        source_id: &CustomerId,
        destination_account_number: &str,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<Execution<TransferReceipt>, LedgerError> {
        require_positive_amount("amount", amount)?;
        let destination_account_number = destination_account_number.trim();
        if destination_account_number.is_empty() {
            return Err(LedgerError::invalid(
                "destinationAccountNumber",
                "Nomor rekening tujuan wajib diisi.",
            ));
        }
        let notes = clean_notes(notes);

        self.execute("transfer", key, |posting| {
            let source = posting.customer(source_id)?;
            let destination = posting
                .store()
                .customer_by_account_number(destination_account_number)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("Rekening tujuan", destination_account_number))?;

            if source.id == destination.id {
                return Err(LedgerError::SelfTransfer);
            }
            if !source.is_active() || !destination.is_active() {
                return Err(LedgerError::TransferPartyInactive);
            }
            if source.balance < amount {
                return Err(LedgerError::insufficient_customer_funds(source.balance, amount));
            }

            let debit = posting.post_customer(
                &source.id,
                CustomerEntry::debit(
                    amount,
                    format!("TRANSFER KELUAR ke {}", destination.name()),
                    ReceiptPrefix::Transfer,
                )
                .with_notes(notes.clone()),
            )?;
            let credit = posting.post_customer(
                &destination.id,
                CustomerEntry::credit(
                    amount,
                    format!("TRANSFER MASUK dari {}", source.name()),
                    ReceiptPrefix::Transfer,
                )
                .with_notes(notes),
            )?;

            Ok(TransferReceipt {
                source: posting.customer(&source.id)?,
                destination: posting.customer(&destination.id)?,
                debit,
                credit,
            })
        })
    }

    /// Retire a customer account
    ///
    /// Only a balance strictly below the dust threshold may be retired. A
    /// remaining sub-unit balance is written off to exactly zero with its own
    /// DEBIT line so the change stays auditable.
    pub fn deactivate_customer(&self, customer_id: &CustomerId) -> Result<Deactivation, LedgerError> {
        let threshold = self.policy().deactivation_dust_threshold;

        self.execute_unkeyed("deactivate_customer", |posting| {
            let customer = posting.customer(customer_id)?;
            if customer.balance >= threshold {
                return Err(LedgerError::BalanceNotZero {
                    balance: customer.balance,
                });
            }

            let written_off = if customer.balance > Decimal::ZERO {
                let dust = customer.balance;
                let line = posting.post_customer(
                    customer_id,
                    CustomerEntry::debit(dust, WRITE_OFF_DESCRIPTION, ReceiptPrefix::Withdrawal),
                )?;
                warn!(
                    customer_id = %customer_id,
                    amount = %dust,
                    receipt = %line.receipt_number,
                    "sub-unit balance written off on deactivation"
                );
                Some(line)
            } else {
                None
            };

            let mut customer = posting.customer(customer_id)?;
            customer.balance = Decimal::ZERO;
            customer.status = CustomerStatus::Inactive;
            let customer = posting.save_customer(customer)?;

            Ok(Deactivation {
                customer,
                written_off,
            })
        })
    }

    /// Return a customer to ACTIVE; no balance precondition
    pub fn activate_customer(&self, customer_id: &CustomerId) -> Result<Customer, LedgerError> {
        self.execute_unkeyed("activate_customer", |posting| {
            let mut customer = posting.customer(customer_id)?;
            customer.status = CustomerStatus::Active;
            posting.save_customer(customer)
        })
    }

    /// Active customers whose name or account number contains `query`
    ///
    /// Case-insensitive, capped at the policy search limit, ordered by name.
    /// An empty query returns nothing.
    pub fn search_active_customers(&self, query: &str) -> Result<Vec<CustomerSummary>, LedgerError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let limit = self.policy().search_limit;

        Ok(self.store().read(|state| {
            let mut matches: Vec<CustomerSummary> = state
                .customers()
                .filter(|customer| customer.is_active())
                .filter(|customer| {
                    customer.name().to_lowercase().contains(&needle)
                        || customer.account_number.to_lowercase().contains(&needle)
                })
                .map(CustomerSummary::from)
                .collect();
            matches.sort_by(|a, b| a.name.cmp(&b.name));
            matches.truncate(limit);
            matches
        })?)
    }

    /// Full customer record
    pub fn customer(&self, customer_id: &CustomerId) -> Result<Customer, LedgerError> {
        self.store()
            .read(|state| state.customer(customer_id).cloned())?
            .ok_or_else(|| LedgerError::not_found("Nasabah", customer_id))
    }

    /// Customer summary, served from the view cache when possible
    pub fn customer_summary(&self, customer_id: &CustomerId) -> Result<CustomerSummary, LedgerError> {
        if let Some(summary) = self.cache().customer(customer_id) {
            return Ok(summary);
        }
        let cache = self.cache();
        self.store()
            .read(|state| {
                state.customer(customer_id).map(|customer| {
                    let summary = CustomerSummary::from(customer);
                    cache.store_customer(summary.clone());
                    summary
                })
            })?
            .ok_or_else(|| LedgerError::not_found("Nasabah", customer_id))
    }
}

/// Post a cash movement and its main-account mirror
fn post_cash(
    posting: &mut Posting<'_, '_>,
    customer_id: &CustomerId,
    entry_type: EntryType,
    amount: Decimal,
    description: &str,
    notes: Option<String>,
) -> Result<CashMovement, LedgerError> {
    let (entry, source) = match entry_type {
        EntryType::Kredit => (
            CustomerEntry::credit(amount, description, ReceiptPrefix::Deposit),
            PostingSource::FromCustomerDeposit,
        ),
        EntryType::Debit => (
            CustomerEntry::debit(amount, description, ReceiptPrefix::Withdrawal),
            PostingSource::FromCustomerWithdrawal,
        ),
    };
    let transaction = posting.post_customer(customer_id, entry.with_notes(notes.clone()))?;

    let customer = posting.customer(customer_id)?;
    let mirror_description = format!("{} - {}", description, customer.name());
    let mirror = match entry_type {
        EntryType::Kredit => MainEntry::credit(amount, mirror_description, source),
        EntryType::Debit => MainEntry::debit(amount, mirror_description, source),
    };
    let main_transaction = posting.post_main(mirror.with_notes(notes).mirroring(&transaction))?;

    Ok(CashMovement {
        customer,
        transaction,
        main_transaction,
    })
}
