//! Profit-sharing (bagi hasil) distribution
//!
//! A total is split evenly across every ACTIVE customer, floored to the
//! smallest currency unit. The main account is debited by the full total;
//! the remainder left by flooring stays with the cooperative and is
//! recorded on the event and in the debit line's notes.
//!
//! The whole distribution is one transaction: either every recipient is
//! credited or none is. The store lock is held for its duration, which is
//! the throughput ceiling as the number of customers grows.

use super::engine::{require_positive_amount, Execution, LedgerEngine};
use super::idempotency::IdempotencyKey;
use super::posting::{CustomerEntry, MainEntry};
use super::receipt::ReceiptPrefix;
use crate::types::{
    split_evenly, BulkOperation, EventLink, LedgerError, PostingSource, ProfitSharingEvent,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Read-only preview of a distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSharingPreview {
    pub active_customers: usize,
    pub total_amount: Decimal,
    pub amount_per_recipient: Decimal,
    pub total_distributed: Decimal,
    pub remainder: Decimal,

    /// Whether the main account currently covers `total_amount`
    pub sufficient_funds: bool,
}

fn distribution_description(date: &str) -> String {
    format!("Bagi Hasil - {}", date)
}

/// Every recipient must receive at least the smallest money unit
fn require_nonzero_share(per_recipient: Decimal) -> Result<(), LedgerError> {
    if per_recipient.is_zero() {
        return Err(LedgerError::invalid(
            "totalAmount",
            "Jumlah terlalu kecil untuk dibagikan.",
        ));
    }
    Ok(())
}

impl LedgerEngine {
    /// Distribute `total_amount` evenly across all active customers
    ///
    /// # Errors
    ///
    /// - `Validation` if the total is not a positive money amount
    /// - `InsufficientFunds` if the main account is below the total
    /// - `NoEligibleRecipients` if no customer is ACTIVE
    /// - `Validation` if the total is too small to give everyone 0.01
    pub fn execute_profit_sharing(
        &self,
        key: &IdempotencyKey,
        total_amount: Decimal,
    ) -> Result<Execution<ProfitSharingEvent>, LedgerError> {
        require_positive_amount("totalAmount", total_amount)?;

        self.execute("execute_profit_sharing", key, |posting| {
            let main_balance = posting.main_balance();
            if main_balance < total_amount {
                return Err(LedgerError::insufficient_main_funds(main_balance, total_amount));
            }

            let recipients: Vec<_> = posting
                .store()
                .active_customers()
                .into_iter()
                .map(|customer| customer.id)
                .collect();
            if recipients.is_empty() {
                return Err(LedgerError::NoEligibleRecipients {
                    operation: BulkOperation::ProfitSharing,
                });
            }

            let number_of_recipients = u32::try_from(recipients.len())
                .map_err(|_| LedgerError::overflow("jumlah penerima"))?;
            let split = split_evenly(total_amount, number_of_recipients)
                .ok_or_else(|| LedgerError::overflow("bagi hasil"))?;
            require_nonzero_share(split.per_recipient)?;

            let description = distribution_description(&posting.now().format("%d/%m/%Y").to_string());
            let debit = posting.post_main(
                MainEntry::debit(total_amount, description.clone(), PostingSource::ProfitSharing)
                    .with_notes(Some(format!(
                        "Total didistribusikan: {}. Sisa pembulatan: {} dikembalikan.",
                        split.distributed, split.remainder
                    ))),
            )?;

            let event = ProfitSharingEvent {
                id: Uuid::new_v4(),
                executed_at: posting.now(),
                total_amount_shared: total_amount,
                number_of_recipients,
                amount_per_recipient: split.per_recipient,
                remainder_amount: split.remainder,
                main_account_debit_tx_id: debit.id,
            };
            posting
                .store_mut()
                .insert_profit_sharing_event(event.clone());

            for customer_id in &recipients {
                posting.post_customer(
                    customer_id,
                    CustomerEntry::credit(split.per_recipient, description.clone(), ReceiptPrefix::Deposit)
                        .linked_to(EventLink::ProfitSharing(event.id)),
                )?;
            }

            Ok(event)
        })
    }

    /// Number of customers a distribution would currently reach
    pub fn active_customers_count(&self) -> Result<usize, LedgerError> {
        if let Some(count) = self.cache().active_count() {
            return Ok(count);
        }
        let cache = self.cache();
        Ok(self.store().read(|state| {
            let count = state.customers().filter(|customer| customer.is_active()).count();
            cache.store_active_count(count);
            count
        })?)
    }

    /// What a distribution of `total_amount` would do, without doing it
    pub fn preview_profit_sharing(&self, total_amount: Decimal) -> Result<ProfitSharingPreview, LedgerError> {
        require_positive_amount("totalAmount", total_amount)?;
        let active_customers = self.active_customers_count()?;
        let main_balance = self.main_balance()?;

        let (amount_per_recipient, total_distributed, remainder) = match u32::try_from(active_customers) {
            Ok(count) if count > 0 => {
                let split = split_evenly(total_amount, count)
                    .ok_or_else(|| LedgerError::overflow("bagi hasil"))?;
                require_nonzero_share(split.per_recipient)?;
                (split.per_recipient, split.distributed, split.remainder)
            }
            _ => (Decimal::ZERO, Decimal::ZERO, total_amount),
        };

        Ok(ProfitSharingPreview {
            active_customers,
            total_amount,
            amount_per_recipient,
            total_distributed,
            remainder,
            sufficient_funds: main_balance >= total_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomerProfile, Gender, MainAccountTransaction};
    use chrono::NaiveDate;

    fn seed(engine: &LedgerEngine, customers: usize, main_top_up: i64) -> Vec<uuid::Uuid> {
        let ids = (0..customers)
            .map(|i| {
                engine
                    .register_customer(
                        &IdempotencyKey::generate(),
                        CustomerProfile {
                            name: format!("Anggota {:02}", i),
                            id_number: format!("32010000000{:05}", i),
                            address: "Jl. Pahlawan No. 3, Surabaya".to_string(),
                            phone: "081355556666".to_string(),
                            gender: Gender::Male,
                            birth_date: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                        },
                        Decimal::new(50_000, 0),
                    )
                    .unwrap()
                    .applied()
                    .unwrap()
                    .customer
                    .id
            })
            .collect();
        if main_top_up > 0 {
            engine
                .top_up_main(
                    &IdempotencyKey::generate(),
                    Decimal::new(main_top_up, 0),
                    "Modal".to_string(),
                    None,
                )
                .unwrap();
        }
        ids
    }

    #[test]
    fn test_seven_way_distribution_is_exact() {
        let engine = LedgerEngine::in_memory();
        // 7 x 50,000 opening deposits + 650,000 top-up = 1,000,000
        let ids = seed(&engine, 7, 650_000);
        assert_eq!(engine.main_balance().unwrap(), Decimal::new(1_000_000, 0));

        let event = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(700_000, 0))
            .unwrap()
            .applied()
            .unwrap();

        assert_eq!(event.number_of_recipients, 7);
        assert_eq!(event.amount_per_recipient, Decimal::new(100_000, 0));
        assert_eq!(event.remainder_amount, Decimal::ZERO);
        assert_eq!(engine.main_balance().unwrap(), Decimal::new(300_000, 0));
        for id in ids {
            assert_eq!(engine.customer(&id).unwrap().balance, Decimal::new(150_000, 0));
        }
    }

    #[test]
    fn test_remainder_stays_with_main_account() {
        let engine = LedgerEngine::in_memory();
        let ids = seed(&engine, 3, 0);

        let event = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(1000, 0))
            .unwrap()
            .applied()
            .unwrap();

        assert_eq!(event.amount_per_recipient, Decimal::new(33_333, 2));
        assert_eq!(event.remainder_amount, Decimal::new(1, 2));
        assert_eq!(
            event.amount_per_recipient * Decimal::from(3) + event.remainder_amount,
            Decimal::new(1000, 0)
        );

        let debit: MainAccountTransaction = engine
            .store()
            .read(|state| {
                state
                    .main_account_transactions()
                    .iter()
                    .find(|line| line.id == event.main_account_debit_tx_id)
                    .cloned()
            })
            .unwrap()
            .unwrap();
        assert_eq!(debit.amount, Decimal::new(1000, 0));
        assert_eq!(debit.source, PostingSource::ProfitSharing);
        assert_eq!(
            debit.notes.as_deref(),
            Some("Total didistribusikan: 999.99. Sisa pembulatan: 0.01 dikembalikan.")
        );
        for id in ids {
            assert_eq!(engine.customer(&id).unwrap().balance, Decimal::new(5_033_333, 2));
        }
    }

    #[test]
    fn test_no_active_customers_mutates_nothing() {
        let engine = LedgerEngine::in_memory();
        engine
            .top_up_main(&IdempotencyKey::generate(), Decimal::new(10_000, 0), "Modal".to_string(), None)
            .unwrap();

        let err = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(1_000, 0))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::NoEligibleRecipients {
                operation: BulkOperation::ProfitSharing
            }
        );
        assert_eq!(engine.main_balance().unwrap(), Decimal::new(10_000, 0));
        assert!(engine.store().read(|s| s.profit_sharing_events().is_empty()).unwrap());
    }

    #[test]
    fn test_insufficient_main_balance() {
        let engine = LedgerEngine::in_memory();
        seed(&engine, 2, 0);

        let err = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(100_001, 0))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::insufficient_main_funds(Decimal::new(100_000, 0), Decimal::new(100_001, 0))
        );
    }

    #[test]
    fn test_preview_has_no_side_effects() {
        let engine = LedgerEngine::in_memory();
        seed(&engine, 3, 0);

        let preview = engine.preview_profit_sharing(Decimal::new(1000, 0)).unwrap();
        assert_eq!(preview.active_customers, 3);
        assert_eq!(preview.amount_per_recipient, Decimal::new(33_333, 2));
        assert_eq!(preview.remainder, Decimal::new(1, 2));
        assert!(preview.sufficient_funds);
        assert!(engine.store().read(|s| s.profit_sharing_events().is_empty()).unwrap());
    }

    #[test]
    fn test_total_too_small_to_split_is_rejected() {
        let engine = LedgerEngine::in_memory();
        let ids = seed(&engine, 3, 0);
        let lines_before = engine
            .store()
            .read(|s| (s.transactions().len(), s.main_account_transactions().len()))
            .unwrap();
        let expected = LedgerError::invalid("totalAmount", "Jumlah terlalu kecil untuk dibagikan.");

        let err = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(2, 2))
            .unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(engine.preview_profit_sharing(Decimal::new(2, 2)).unwrap_err(), expected);

        assert_eq!(engine.main_balance().unwrap(), Decimal::new(150_000, 0));
        for id in ids {
            assert_eq!(engine.customer(&id).unwrap().balance, Decimal::new(50_000, 0));
        }
        let lines_after = engine
            .store()
            .read(|s| (s.transactions().len(), s.main_account_transactions().len()))
            .unwrap();
        assert_eq!(lines_after, lines_before);
        assert!(engine.store().read(|s| s.profit_sharing_events().is_empty()).unwrap());

        // 0.03 is the smallest total that reaches all three
        let event = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(3, 2))
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(event.amount_per_recipient, Decimal::new(1, 2));
    }

    #[test]
    fn test_recipient_lines_link_to_event() {
        let engine = LedgerEngine::in_memory();
        seed(&engine, 4, 0);

        let event = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(4_000, 0))
            .unwrap()
            .applied()
            .unwrap();

        let linked = engine
            .store()
            .read(|state| {
                state
                    .transactions()
                    .iter()
                    .filter(|line| line.event == Some(EventLink::ProfitSharing(event.id)))
                    .count()
            })
            .unwrap();
        assert_eq!(linked, 4);
    }
}
