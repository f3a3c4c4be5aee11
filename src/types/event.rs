//! Historical records of profit-sharing (bagi hasil) and admin-fee
//! (biaya admin) runs.

use super::transaction::{EventId, TransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One profit-sharing distribution
///
/// `amount_per_recipient * number_of_recipients + remainder_amount`
/// always equals `total_amount_shared`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSharingEvent {
    pub id: EventId,
    pub executed_at: DateTime<Utc>,
    pub total_amount_shared: Decimal,
    pub number_of_recipients: u32,
    pub amount_per_recipient: Decimal,

    /// Left with the cooperative after flooring
    pub remainder_amount: Decimal,
    pub main_account_debit_tx_id: TransactionId,
}

/// One admin-fee collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeeEvent {
    pub id: EventId,
    pub executed_at: DateTime<Utc>,
    pub total_amount_collected: Decimal,
    pub number_of_affected_customers: u32,
    pub amount_per_customer: Decimal,
    pub description: String,
    pub main_account_credit_tx_id: TransactionId,
}
