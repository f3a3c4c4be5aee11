//! Error types for the cooperative ledger
//!
//! This module defines every failure a ledger operation can report. Messages
//! are user-facing (Indonesian, as shown to tellers) except for
//! [`StoreError`], whose detail is logged but never shown.
//!
//! # Error Categories
//!
//! - **Validation**: malformed or out-of-range input, keyed by field
//! - **Funds**: a customer or main-account balance cannot cover a debit
//! - **Eligibility**: distribution/fee runs with nobody to apply to
//! - **Lookup**: unknown customer, account number or event
//! - **Domain refusals**: inactive accounts, self-transfer, non-zero balance
//! - **Duplicate execution**: internal signal for a reused idempotency key
//! - **Store**: constraint violations and storage failures

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

/// Validation messages keyed by input field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Which balance failed a funds check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsSource {
    Customer,
    MainAccount,
}

impl FundsSource {
    fn message(&self) -> &'static str {
        match self {
            FundsSource::Customer => "Saldo tidak mencukupi.",
            FundsSource::MainAccount => "Kas koperasi tidak mencukupi.",
        }
    }
}

/// Which bulk operation found no recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    ProfitSharing,
    AdminFee,
}

impl BulkOperation {
    fn empty_message(&self) -> &'static str {
        match self {
            BulkOperation::ProfitSharing => "Tidak ada nasabah aktif yang ditemukan.",
            BulkOperation::AdminFee => "Tidak ada nasabah yang memenuhi kriteria.",
        }
    }
}

/// Main error type for ledger operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Input rejected before anything was written
    #[error("Data tidak valid: {}", summarize(.0))]
    Validation(FieldErrors),

    /// A balance precondition failed; the whole transaction is rolled back
    #[error("{}", account.message())]
    InsufficientFunds {
        account: FundsSource,
        available: Decimal,
        requested: Decimal,
    },

    /// A distribution or fee run found nobody to apply to
    #[error("{}", operation.empty_message())]
    NoEligibleRecipients { operation: BulkOperation },

    #[error("{entity} tidak ditemukan: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Nasabah {name} tidak aktif.")]
    CustomerInactive { name: String },

    #[error("Kedua nasabah harus berstatus aktif.")]
    TransferPartyInactive,

    #[error("Tidak bisa transfer ke rekening sendiri.")]
    SelfTransfer,

    /// Deactivation refused because money would be lost
    #[error("Hanya nasabah dengan saldo nol yang dapat dinonaktifkan (saldo {balance}).")]
    BalanceNotZero { balance: Decimal },

    #[error("Perhitungan {operation} melebihi batas nilai.")]
    ArithmeticOverflow { operation: String },

    /// Idempotency key already consumed by a committed operation
    ///
    /// Never shown as a failure: the engine reports it as "already
    /// processed".
    #[error("Idempotency key {key} has already been used")]
    DuplicateExecution { key: String },

    #[error("Terjadi kesalahan sistem. Operasi gagal.")]
    Store(#[from] StoreError),
}

/// Underlying storage failures
///
/// Carried with full detail for server-side logs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated by '{value}'")]
    UniqueViolation {
        constraint: &'static str,
        value: String,
    },

    #[error("referenced row missing: {0}")]
    MissingRow(String),

    #[error("ledger lock poisoned by a panicked writer")]
    Poisoned,

    #[error("could not generate a unique {kind} after {attempts} attempts")]
    KeySpaceExhausted { kind: &'static str, attempts: usize },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("ledger file is corrupt: {0}")]
    Serialization(String),

    #[error("background task failed: {0}")]
    Task(String),
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl LedgerError {
    /// Single-field validation error
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        LedgerError::Validation(errors)
    }

    pub fn insufficient_customer_funds(available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account: FundsSource::Customer,
            available,
            requested,
        }
    }

    pub fn insufficient_main_funds(available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account: FundsSource::MainAccount,
            available,
            requested,
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// True for failures caused by storage rather than business rules
    pub fn is_internal(&self) -> bool {
        matches!(self, LedgerError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::customer_funds(
        LedgerError::insufficient_customer_funds(Decimal::new(5000, 0), Decimal::new(10000, 0)),
        "Saldo tidak mencukupi."
    )]
    #[case::main_funds(
        LedgerError::insufficient_main_funds(Decimal::ZERO, Decimal::new(10000, 0)),
        "Kas koperasi tidak mencukupi."
    )]
    #[case::no_active(
        LedgerError::NoEligibleRecipients { operation: BulkOperation::ProfitSharing },
        "Tidak ada nasabah aktif yang ditemukan."
    )]
    #[case::no_eligible(
        LedgerError::NoEligibleRecipients { operation: BulkOperation::AdminFee },
        "Tidak ada nasabah yang memenuhi kriteria."
    )]
    #[case::not_found(
        LedgerError::not_found("Nasabah", "KSP2600000000"),
        "Nasabah tidak ditemukan: KSP2600000000"
    )]
    #[case::self_transfer(LedgerError::SelfTransfer, "Tidak bisa transfer ke rekening sendiri.")]
    #[case::balance_not_zero(
        LedgerError::BalanceNotZero { balance: Decimal::new(5000, 0) },
        "Hanya nasabah dengan saldo nol yang dapat dinonaktifkan (saldo 5000)."
    )]
    #[case::validation(
        LedgerError::invalid("amount", "Jumlah harus lebih dari nol."),
        "Data tidak valid: amount: Jumlah harus lebih dari nol."
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_store_error_hides_detail() {
        let error: LedgerError = StoreError::UniqueViolation {
            constraint: "receipt_number",
            value: "SP0000001".to_string(),
        }
        .into();
        assert!(error.is_internal());
        assert_eq!(error.to_string(), "Terjadi kesalahan sistem. Operasi gagal.");
        assert!(!error.to_string().contains("SP0000001"));
    }
}
