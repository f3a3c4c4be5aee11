//! Read-side queries
//!
//! Customer listing, transaction histories, event history and detail,
//! printable statements and dashboard figures. Nothing here writes.

use super::engine::LedgerEngine;
use crate::types::{
    AdminFeeEvent, Customer, CustomerId, CustomerStatus, EntryType, EventId, EventLink,
    LedgerError, MainAccountTransaction, ProfitSharingEvent, Transaction,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One page of a listing (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        PageRequest {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(1, 10)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_items = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.per_page)
            .collect();
        Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages: total_items.div_ceil(request.per_page),
        }
    }
}

/// Customer listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Case-insensitive match on name or account number
    pub query: Option<String>,
    pub status: Option<CustomerStatus>,
}

/// Inclusive range of calendar days (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, LedgerError> {
        if from > to {
            return Err(LedgerError::invalid(
                "dateRange",
                "Tanggal awal tidak boleh setelah tanggal akhir.",
            ));
        }
        Ok(DateRange { from, to })
    }

    fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from <= day && day <= self.to
    }
}

/// A customer line of an event with the customer's identity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLine {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub account_number: String,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSharingDetail {
    pub event: ProfitSharingEvent,
    pub main_transaction: Option<MainAccountTransaction>,
    pub recipients: Vec<EventLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeeDetail {
    pub event: AdminFeeEvent,
    pub main_transaction: Option<MainAccountTransaction>,
    pub charged: Vec<EventLine>,
}

/// Printable account statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub customer: Customer,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Decimal,
    pub total_credit: Decimal,
    pub total_debit: Decimal,
    pub closing_balance: Decimal,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Latest snapshot balance on or before the end of the range
    pub main_account_balance: Decimal,
    pub active_customer_count: usize,
    pub total_transaction_volume: Decimal,
}

fn event_lines<'a>(
    state: &crate::store::LedgerState,
    lines: impl Iterator<Item = &'a Transaction>,
) -> Vec<EventLine> {
    let mut rows: Vec<EventLine> = lines
        .filter_map(|line| {
            state.customer(&line.customer_id).map(|customer| EventLine {
                customer_id: customer.id,
                customer_name: customer.name().to_string(),
                account_number: customer.account_number.clone(),
                transaction: line.clone(),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.customer_name.cmp(&b.customer_name));
    rows
}

impl LedgerEngine {
    /// Customers ordered ACTIVE first, then newest first
    pub fn list_customers(
        &self,
        filter: &CustomerFilter,
        request: PageRequest,
    ) -> Result<Page<Customer>, LedgerError> {
        let needle = filter
            .query
            .as_deref()
            .map(|query| query.trim().to_lowercase())
            .unwrap_or_default();

        let mut customers: Vec<Customer> = self.store().read(|state| {
            state
                .customers()
                .filter(|customer| filter.status.map_or(true, |status| customer.status == status))
                .filter(|customer| {
                    needle.is_empty()
                        || customer.name().to_lowercase().contains(&needle)
                        || customer.account_number.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        })?;
        customers.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(Page::slice(customers, request))
    }

    /// Ledger lines of one customer, newest first
    pub fn customer_history(
        &self,
        customer_id: &CustomerId,
        request: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        let lines = self.store().read(|state| {
            state.customer(customer_id).map(|_| {
                state
                    .transactions()
                    .iter()
                    .rev()
                    .filter(|line| line.customer_id == *customer_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })?;
        let lines = lines.ok_or_else(|| LedgerError::not_found("Nasabah", customer_id))?;
        Ok(Page::slice(lines, request))
    }

    /// Main-account ledger lines, newest first
    pub fn main_account_history(
        &self,
        request: PageRequest,
    ) -> Result<Page<MainAccountTransaction>, LedgerError> {
        let lines = self.store().read(|state| {
            state
                .main_account_transactions()
                .iter()
                .rev()
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(Page::slice(lines, request))
    }

    /// Profit-sharing events, newest first
    pub fn profit_sharing_events(
        &self,
        request: PageRequest,
    ) -> Result<Page<ProfitSharingEvent>, LedgerError> {
        let events = self.store().read(|state| {
            state.profit_sharing_events().iter().rev().cloned().collect::<Vec<_>>()
        })?;
        Ok(Page::slice(events, request))
    }

    /// Admin-fee events, newest first
    pub fn admin_fee_events(&self, request: PageRequest) -> Result<Page<AdminFeeEvent>, LedgerError> {
        let events = self.store().read(|state| {
            state.admin_fee_events().iter().rev().cloned().collect::<Vec<_>>()
        })?;
        Ok(Page::slice(events, request))
    }

    /// A distribution with every recipient line, ordered by customer name
    pub fn profit_sharing_detail(&self, event_id: &EventId) -> Result<ProfitSharingDetail, LedgerError> {
        self.store()
            .read(|state| {
                let event = state.profit_sharing_event(event_id)?.clone();
                let link = Some(EventLink::ProfitSharing(event.id));
                let recipients = event_lines(
                    state,
                    state.transactions().iter().filter(|line| line.event == link),
                );
                let main_transaction = state
                    .main_account_transactions()
                    .iter()
                    .find(|line| line.id == event.main_account_debit_tx_id)
                    .cloned();
                Some(ProfitSharingDetail {
                    event,
                    main_transaction,
                    recipients,
                })
            })?
            .ok_or_else(|| LedgerError::not_found("Event bagi hasil", event_id))
    }

    /// A fee run with every charged line, ordered by customer name
    pub fn admin_fee_detail(&self, event_id: &EventId) -> Result<AdminFeeDetail, LedgerError> {
        self.store()
            .read(|state| {
                let event = state.admin_fee_event(event_id)?.clone();
                let link = Some(EventLink::AdminFee(event.id));
                let charged = event_lines(
                    state,
                    state.transactions().iter().filter(|line| line.event == link),
                );
                let main_transaction = state
                    .main_account_transactions()
                    .iter()
                    .find(|line| line.id == event.main_account_credit_tx_id)
                    .cloned();
                Some(AdminFeeDetail {
                    event,
                    main_transaction,
                    charged,
                })
            })?
            .ok_or_else(|| LedgerError::not_found("Event biaya admin", event_id))
    }

    /// Statement of one customer over `range`
    ///
    /// The opening balance is derived backwards from the current balance:
    /// `current - credits since start + debits since start`.
    pub fn statement(&self, customer_id: &CustomerId, range: DateRange) -> Result<Statement, LedgerError> {
        let start = range.start();

        let statement = self.store().read(|state| {
            let customer = state.customer(customer_id)?.clone();
            let mut credits_since = Decimal::ZERO;
            let mut debits_since = Decimal::ZERO;
            let mut transactions = Vec::new();

            for line in state
                .transactions()
                .iter()
                .filter(|line| line.customer_id == *customer_id)
            {
                if line.created_at >= start {
                    match line.entry_type {
                        EntryType::Kredit => credits_since += line.amount,
                        EntryType::Debit => debits_since += line.amount,
                    }
                }
                if range.contains(line.created_at) {
                    transactions.push(line.clone());
                }
            }
            transactions.sort_by_key(|line| line.created_at);

            let opening_balance = customer.balance - credits_since + debits_since;
            let (total_credit, total_debit) =
                transactions
                    .iter()
                    .fold((Decimal::ZERO, Decimal::ZERO), |(credit, debit), line| {
                        match line.entry_type {
                            EntryType::Kredit => (credit + line.amount, debit),
                            EntryType::Debit => (credit, debit + line.amount),
                        }
                    });

            Some(Statement {
                closing_balance: opening_balance + total_credit - total_debit,
                customer,
                from: range.from,
                to: range.to,
                opening_balance,
                total_credit,
                total_debit,
                transactions,
            })
        })?;

        statement.ok_or_else(|| LedgerError::not_found("Nasabah", customer_id))
    }

    /// Headline figures for the dashboard over `range`
    pub fn dashboard_stats(&self, range: DateRange) -> Result<DashboardStats, LedgerError> {
        Ok(self.store().read(|state| {
            let main_account_balance = state
                .daily_balance_snapshots()
                .iter()
                .rev()
                .find(|snapshot| snapshot.date <= range.to)
                .map(|snapshot| snapshot.balance)
                .unwrap_or(Decimal::ZERO);
            let active_customer_count = state.customers().filter(|c| c.is_active()).count();
            let total_transaction_volume = state
                .transactions()
                .iter()
                .filter(|line| range.contains(line.created_at))
                .map(|line| line.amount)
                .sum();

            DashboardStats {
                main_account_balance,
                active_customer_count,
                total_transaction_volume,
            }
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::idempotency::IdempotencyKey;
    use crate::core::traits::FixedClock;
    use crate::types::{CustomerProfile, Gender};
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn engine_at(clock: &Arc<FixedClock>) -> LedgerEngine {
        LedgerEngine::in_memory().with_clock(clock.clone())
    }

    fn register(engine: &LedgerEngine, n: u32, name: &str, balance: i64) -> Customer {
        engine
            .register_customer(
                &IdempotencyKey::generate(),
                CustomerProfile {
                    name: name.to_string(),
                    id_number: format!("35010000000{:05}", n),
                    address: "Jl. Ahmad Yani No. 20, Malang".to_string(),
                    phone: "081399990000".to_string(),
                    gender: Gender::Male,
                    birth_date: NaiveDate::from_ymd_opt(1975, 6, 1).unwrap(),
                },
                Decimal::new(balance, 0),
            )
            .unwrap()
            .applied()
            .unwrap()
            .customer
    }

    #[rstest]
    #[case(1, 10, 25, 10, 3)]
    #[case(3, 10, 25, 5, 3)]
    #[case(4, 10, 25, 0, 3)]
    #[case(1, 30, 25, 25, 1)]
    fn test_page_slicing(
        #[case] page: usize,
        #[case] per_page: usize,
        #[case] total: usize,
        #[case] expected_items: usize,
        #[case] expected_pages: usize,
    ) {
        let sliced = Page::slice((0..total).collect(), PageRequest::new(page, per_page));
        assert_eq!(sliced.items.len(), expected_items);
        assert_eq!(sliced.total_pages, expected_pages);
        assert_eq!(sliced.total_items, total);
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(DateRange::new(day(5), day(4)).is_err());
        assert!(DateRange::new(day(4), day(4)).is_ok());
    }

    #[test]
    fn test_statement_opening_and_closing() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let engine = engine_at(&clock);
        let customer = register(&engine, 1, "Bambang", 100_000);

        clock.set(Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap());
        engine
            .deposit(&IdempotencyKey::generate(), &customer.id, Decimal::new(40_000, 0), None)
            .unwrap();
        clock.advance(Duration::days(2));
        engine
            .withdraw(&IdempotencyKey::generate(), &customer.id, Decimal::new(15_000, 0), None)
            .unwrap();
        clock.advance(Duration::days(5));
        engine
            .deposit(&IdempotencyKey::generate(), &customer.id, Decimal::new(1_000, 0), None)
            .unwrap();

        let statement = engine
            .statement(&customer.id, DateRange::new(day(5), day(7)).unwrap())
            .unwrap();

        assert_eq!(statement.opening_balance, Decimal::new(100_000, 0));
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.total_credit, Decimal::new(40_000, 0));
        assert_eq!(statement.total_debit, Decimal::new(15_000, 0));
        assert_eq!(statement.closing_balance, Decimal::new(125_000, 0));
        assert!(statement.transactions[0].created_at <= statement.transactions[1].created_at);
    }

    #[test]
    fn test_list_customers_orders_active_first_then_newest() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let engine = engine_at(&clock);
        let oldest = register(&engine, 1, "Ani", 50_000);
        clock.advance(Duration::hours(1));
        let middle = register(&engine, 2, "Budi", 50_000);
        clock.advance(Duration::hours(1));
        let newest = register(&engine, 3, "Citra", 50_000);

        engine
            .withdraw(&IdempotencyKey::generate(), &newest.id, Decimal::new(50_000, 0), None)
            .unwrap();
        engine.deactivate_customer(&newest.id).unwrap();

        let page = engine
            .list_customers(&CustomerFilter::default(), PageRequest::default())
            .unwrap();
        let order: Vec<_> = page.items.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![middle.id, oldest.id, newest.id]);

        let inactive = engine
            .list_customers(
                &CustomerFilter {
                    query: None,
                    status: Some(CustomerStatus::Inactive),
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(inactive.total_items, 1);

        let by_query = engine
            .list_customers(
                &CustomerFilter {
                    query: Some("BUD".to_string()),
                    status: None,
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(by_query.items[0].id, middle.id);
    }

    #[test]
    fn test_profit_sharing_detail_sorted_by_name() {
        let engine = LedgerEngine::in_memory();
        register(&engine, 1, "Zainal", 50_000);
        register(&engine, 2, "Agus", 50_000);

        let event = engine
            .execute_profit_sharing(&IdempotencyKey::generate(), Decimal::new(2_000, 0))
            .unwrap()
            .applied()
            .unwrap();
        let detail = engine.profit_sharing_detail(&event.id).unwrap();

        let names: Vec<_> = detail.recipients.iter().map(|r| r.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Agus", "Zainal"]);
        assert_eq!(detail.main_transaction.map(|t| t.id), Some(event.main_account_debit_tx_id));

        assert!(matches!(
            engine.profit_sharing_detail(&uuid::Uuid::new_v4()),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            engine.admin_fee_detail(&event.id),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dashboard_uses_latest_snapshot_before_end() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));
        let engine = engine_at(&clock);
        register(&engine, 1, "Dodi", 80_000);
        engine.record_daily_snapshot(day(2)).unwrap();
        engine
            .top_up_main(&IdempotencyKey::generate(), Decimal::new(20_000, 0), "Modal".to_string(), None)
            .unwrap();
        engine.record_daily_snapshot(day(9)).unwrap();

        let stats = engine
            .dashboard_stats(DateRange::new(day(1), day(5)).unwrap())
            .unwrap();
        assert_eq!(stats.main_account_balance, Decimal::new(80_000, 0));
        assert_eq!(stats.active_customer_count, 1);
        assert_eq!(stats.total_transaction_volume, Decimal::new(80_000, 0));
    }

    #[test]
    fn test_histories_newest_first() {
        let engine = LedgerEngine::in_memory();
        let customer = register(&engine, 1, "Eka", 60_000);
        engine
            .deposit(&IdempotencyKey::generate(), &customer.id, Decimal::new(5_000, 0), None)
            .unwrap();

        let history = engine.customer_history(&customer.id, PageRequest::default()).unwrap();
        assert_eq!(history.total_items, 2);
        assert_eq!(history.items[0].amount, Decimal::new(5_000, 0));

        let main = engine.main_account_history(PageRequest::new(1, 1)).unwrap();
        assert_eq!(main.total_pages, 2);
        assert_eq!(main.items[0].amount, Decimal::new(5_000, 0));
    }
}
