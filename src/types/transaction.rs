//! Ledger line types for the cooperative ledger
//!
//! This module defines the two append-only ledgers (customer-side
//! `Transaction` and operational-side `MainAccountTransaction`), the
//! singleton `MainAccount`, and the identifiers shared between them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer identifier
pub type CustomerId = Uuid;

/// Identifier of a ledger line in either ledger
pub type TransactionId = Uuid;

/// Identifier of a profit-sharing or admin-fee event
pub type EventId = Uuid;

/// Well-known identifier of the single operational account
///
/// The main account is looked up by this id rather than "first row found",
/// so lazy creation can never produce a second row.
pub const MAIN_ACCOUNT_ID: Uuid = Uuid::from_u128(0x4b53_5000_0000_0000_0000_0000_0000_0001);

/// Display name given to the main account on lazy creation
pub const MAIN_ACCOUNT_NAME: &str = "Kas Operasional Koperasi";

/// Direction of a ledger line
///
/// KREDIT increases the owning balance, DEBIT decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Kredit,
    Debit,
}

impl EntryType {
    /// Signed effect of `amount` on the owning balance
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            EntryType::Kredit => amount,
            EntryType::Debit => -amount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Kredit => "KREDIT",
            EntryType::Debit => "DEBIT",
        }
    }
}

/// Why a main-account posting exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostingSource {
    /// Manual top-up or withdrawal of the operational float
    ManualOperational,
    /// Mirror side of a customer cash deposit
    FromCustomerDeposit,
    /// Mirror side of a customer cash withdrawal
    FromCustomerWithdrawal,
    /// Debit funding a profit-sharing distribution
    ProfitSharing,
    /// Credit collected by an admin-fee run
    AdminFee,
}

/// Link from a customer ledger line to the event that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventLink {
    ProfitSharing(EventId),
    AdminFee(EventId),
}

/// Customer ledger line
///
/// Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub customer_id: CustomerId,

    /// Unique across both ledgers
    pub receipt_number: String,

    /// Always positive; direction comes from `entry_type`
    pub amount: Decimal,

    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub description: String,
    pub notes: Option<String>,
    pub event: Option<EventLink>,
    pub created_at: DateTime<Utc>,
}

/// Operational ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainAccountTransaction {
    pub id: TransactionId,
    pub main_account_id: Uuid,
    pub receipt_number: String,
    pub amount: Decimal,

    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub description: String,
    pub notes: Option<String>,
    pub source: PostingSource,

    /// Originating customer line for deposit/withdrawal mirrors
    pub customer_transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}

/// The cooperative's operational cash float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainAccount {
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl MainAccount {
    /// Fresh main account with zero balance under the well-known id
    pub fn new(now: DateTime<Utc>) -> Self {
        MainAccount {
            id: MAIN_ACCOUNT_ID,
            name: MAIN_ACCOUNT_NAME.to_string(),
            balance: Decimal::ZERO,
            updated_at: now,
        }
    }
}

/// Materialized main-account balance at the end of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBalanceSnapshot {
    pub date: NaiveDate,
    pub balance: Decimal,
}
