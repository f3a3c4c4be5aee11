//! Admin-fee (biaya admin) collection
//!
//! A fixed fee is charged to every ACTIVE customer whose balance covers it;
//! everyone else is skipped. The collected total is credited to the main
//! account. Customers left below the deactivation floor by the charge are
//! retired in the same transaction.

use super::engine::{require_positive_amount, Execution, LedgerEngine};
use super::idempotency::IdempotencyKey;
use super::posting::{CustomerEntry, MainEntry};
use super::receipt::ReceiptPrefix;
use crate::types::{
    AdminFeeEvent, BulkOperation, CustomerId, CustomerStatus, EventLink, LedgerError,
    PostingSource,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

const MIN_DESCRIPTION_CHARS: usize = 3;
const MAX_DESCRIPTION_CHARS: usize = 100;

/// A committed fee run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeeCollection {
    pub event: AdminFeeEvent,

    /// Charged customers retired by the post-charge sweep
    pub deactivated: Vec<CustomerId>,
}

/// Read-only preview of a fee run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeePreview {
    pub eligible_customers: usize,
    pub amount_per_customer: Decimal,
    pub total_amount: Decimal,
    pub customers_to_deactivate: usize,
}

fn validate_description(description: &str) -> Result<String, LedgerError> {
    let description = description.trim();
    let chars = description.chars().count();
    if chars < MIN_DESCRIPTION_CHARS {
        return Err(LedgerError::invalid("description", "Deskripsi wajib diisi."));
    }
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(LedgerError::invalid(
            "description",
            "Deskripsi tidak boleh lebih dari 100 karakter.",
        ));
    }
    Ok(description.to_string())
}

fn total_for(amount_per_customer: Decimal, count: usize) -> Result<Decimal, LedgerError> {
    amount_per_customer
        .checked_mul(Decimal::from(count))
        .ok_or_else(|| LedgerError::overflow("biaya admin"))
}

impl LedgerEngine {
    /// Charge `amount_per_customer` to every eligible customer
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or a bad description
    /// - `NoEligibleRecipients` if no active customer can cover the fee
    pub fn execute_admin_fee(
        &self,
        key: &IdempotencyKey,
        amount_per_customer: Decimal,
        description: String,
    ) -> Result<Execution<AdminFeeCollection>, LedgerError> {
        require_positive_amount("amountPerCustomer", amount_per_customer)?;
        let description = validate_description(&description)?;
        let floor = self.policy().admin_fee_deactivation_floor;

        self.execute("execute_admin_fee", key, |posting| {
            let charged: Vec<CustomerId> = posting
                .store()
                .active_customers()
                .into_iter()
                .filter(|customer| customer.balance >= amount_per_customer)
                .map(|customer| customer.id)
                .collect();
            if charged.is_empty() {
                return Err(LedgerError::NoEligibleRecipients {
                    operation: BulkOperation::AdminFee,
                });
            }

            let number_of_affected_customers = u32::try_from(charged.len())
                .map_err(|_| LedgerError::overflow("jumlah nasabah"))?;
            let total_amount_collected = total_for(amount_per_customer, charged.len())?;

            let event_id = Uuid::new_v4();
            let credit = posting.post_main(MainEntry::credit(
                total_amount_collected,
                format!("Biaya Admin: {}", description),
                PostingSource::AdminFee,
            ))?;
            let event = AdminFeeEvent {
                id: event_id,
                executed_at: posting.now(),
                total_amount_collected,
                number_of_affected_customers,
                amount_per_customer,
                description: description.clone(),
                main_account_credit_tx_id: credit.id,
            };
            posting.store_mut().insert_admin_fee_event(event.clone());

            let mut deactivated = Vec::new();
            for customer_id in &charged {
                posting.post_customer(
                    customer_id,
                    CustomerEntry::debit(amount_per_customer, description.clone(), ReceiptPrefix::Withdrawal)
                        .linked_to(EventLink::AdminFee(event_id)),
                )?;

                let mut customer = posting.customer(customer_id)?;
                if customer.balance < floor {
                    customer.status = CustomerStatus::Inactive;
                    posting.save_customer(customer)?;
                    deactivated.push(*customer_id);
                }
            }

            if !deactivated.is_empty() {
                info!(
                    event_id = %event_id,
                    count = deactivated.len(),
                    floor = %floor,
                    "customers deactivated below admin-fee floor"
                );
            }

            Ok(AdminFeeCollection { event, deactivated })
        })
    }

    /// What a fee run of `amount_per_customer` would do, without doing it
    pub fn preview_admin_fee(&self, amount_per_customer: Decimal) -> Result<AdminFeePreview, LedgerError> {
        require_positive_amount("amountPerCustomer", amount_per_customer)?;
        let floor = self.policy().admin_fee_deactivation_floor;

        let (eligible_customers, customers_to_deactivate) = self.store().read(|state| {
            state
                .customers()
                .filter(|customer| customer.is_active() && customer.balance >= amount_per_customer)
                .fold((0usize, 0usize), |(eligible, retiring), customer| {
                    let after = customer.balance - amount_per_customer;
                    (eligible + 1, retiring + usize::from(after < floor))
                })
        })?;

        Ok(AdminFeePreview {
            eligible_customers,
            amount_per_customer,
            total_amount: total_for(amount_per_customer, eligible_customers)?,
            customers_to_deactivate,
        })
    }
}
