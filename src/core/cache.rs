//! Concurrent cache of read views
//!
//! Read views (customer summaries, main-account balance, active customer
//! count) are cached in a `DashMap` keyed per view. Every committed
//! transaction reports what it touched through a [`CommitSummary`]; the
//! engine passes it to [`ViewCache::invalidate`] so cached views never
//! outlive the rows they were built from.
//!
//! Views are populated while the store's read lock is held, and invalidation
//! runs after the commit, so a stale view can never be inserted after the
//! invalidation that should have removed it.

use crate::store::CommitSummary;
use crate::types::{Customer, CustomerId, CustomerStatus};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;

/// Compact customer view used for confirmations and lookups
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub name: String,
    pub account_number: String,
    pub balance: Decimal,
    pub status: CustomerStatus,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        CustomerSummary {
            id: customer.id,
            name: customer.name().to_string(),
            account_number: customer.account_number.clone(),
            balance: customer.balance,
            status: customer.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ViewKey {
    Customer(CustomerId),
    MainBalance,
    ActiveCount,
}

#[derive(Debug, Clone)]
enum View {
    Customer(CustomerSummary),
    Balance(Decimal),
    Count(usize),
}

/// Thread-safe view cache
#[derive(Debug, Default)]
pub struct ViewCache {
    views: DashMap<ViewKey, View>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(&self, id: &CustomerId) -> Option<CustomerSummary> {
        match self.views.get(&ViewKey::Customer(*id)).as_deref() {
            Some(View::Customer(summary)) => Some(summary.clone()),
            _ => None,
        }
    }

    pub fn store_customer(&self, summary: CustomerSummary) {
        self.views
            .insert(ViewKey::Customer(summary.id), View::Customer(summary));
    }

    pub fn main_balance(&self) -> Option<Decimal> {
        match self.views.get(&ViewKey::MainBalance).as_deref() {
            Some(View::Balance(balance)) => Some(*balance),
            _ => None,
        }
    }

    pub fn store_main_balance(&self, balance: Decimal) {
        self.views.insert(ViewKey::MainBalance, View::Balance(balance));
    }

    pub fn active_count(&self) -> Option<usize> {
        match self.views.get(&ViewKey::ActiveCount).as_deref() {
            Some(View::Count(count)) => Some(*count),
            _ => None,
        }
    }

    pub fn store_active_count(&self, count: usize) {
        self.views.insert(ViewKey::ActiveCount, View::Count(count));
    }

    /// Drop every view built from rows the commit touched
    pub fn invalidate(&self, summary: &CommitSummary) {
        for id in &summary.customers {
            self.views.remove(&ViewKey::Customer(*id));
        }
        if !summary.customers.is_empty() {
            self.views.remove(&ViewKey::ActiveCount);
        }
        if summary.main_account_changed {
            self.views.remove(&ViewKey::MainBalance);
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn summary(id: CustomerId) -> CustomerSummary {
        CustomerSummary {
            id,
            name: "Rina".to_string(),
            account_number: "KSP2611111111".to_string(),
            balance: Decimal::new(75_000, 0),
            status: CustomerStatus::Active,
        }
    }

    #[test]
    fn test_invalidate_only_touched_views() {
        let cache = ViewCache::new();
        let touched = Uuid::new_v4();
        let untouched = Uuid::new_v4();
        cache.store_customer(summary(touched));
        cache.store_customer(summary(untouched));
        cache.store_main_balance(Decimal::new(10, 0));
        cache.store_active_count(2);

        cache.invalidate(&CommitSummary {
            customers: vec![touched],
            ..CommitSummary::default()
        });

        assert!(cache.customer(&touched).is_none());
        assert!(cache.customer(&untouched).is_some());
        assert!(cache.active_count().is_none());
        assert_eq!(cache.main_balance(), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn test_main_account_change_drops_balance() {
        let cache = ViewCache::new();
        cache.store_main_balance(Decimal::new(10, 0));
        cache.store_active_count(3);

        cache.invalidate(&CommitSummary {
            main_account_changed: true,
            ..CommitSummary::default()
        });

        assert!(cache.main_balance().is_none());
        assert_eq!(cache.active_count(), Some(3));
    }
}
