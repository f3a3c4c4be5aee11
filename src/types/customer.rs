//! Customer (nasabah) types for the cooperative ledger
//!
//! This module defines the Customer structure, its status lifecycle and the
//! profile fields captured at registration.

use super::transaction::CustomerId;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer account status
///
/// INACTIVE customers cannot transact and are skipped by distribution and
/// fee runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::Active => "ACTIVE",
            CustomerStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

/// Contact and demographic fields of a customer
///
/// Everything here is editable after registration; financial state is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub name: String,

    /// National identity number (16 digits, unique)
    pub id_number: String,
    pub address: String,
    pub phone: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
}

/// Customer identity plus financial state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,

    #[serde(flatten)]
    pub profile: CustomerProfile,

    /// Generated at registration, unique
    pub account_number: String,

    /// Never negative
    pub balance: Decimal,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new active customer with zero balance
    ///
    /// The opening balance is posted afterwards as a regular credit so the
    /// ledger lines always sum to the balance.
    pub fn new(
        id: CustomerId,
        profile: CustomerProfile,
        account_number: String,
        now: DateTime<Utc>,
    ) -> Self {
        Customer {
            id,
            profile,
            account_number,
            balance: Decimal::ZERO,
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            name: "Siti Aminah".to_string(),
            id_number: "3201010101010001".to_string(),
            address: "Jl. Merdeka No. 10, Bandung".to_string(),
            phone: "081234567890".to_string(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        }
    }

    #[test]
    fn test_new_customer_is_active_with_zero_balance() {
        let customer = Customer::new(Uuid::new_v4(), profile(), "KSP2612345678".into(), Utc::now());
        assert!(customer.is_active());
        assert_eq!(customer.balance, Decimal::ZERO);
        assert_eq!(customer.name(), "Siti Aminah");
    }

    #[test]
    fn test_customer_json_flattens_profile() {
        let customer = Customer::new(Uuid::new_v4(), profile(), "KSP2612345678".into(), Utc::now());
        let value = serde_json::to_value(&customer).unwrap();
        assert_eq!(value["name"], "Siti Aminah");
        assert_eq!(value["status"], "ACTIVE");
        assert_eq!(value["gender"], "FEMALE");
        assert_eq!(value["idNumber"], "3201010101010001");
        assert_eq!(value["birthDate"], "1990-05-17");
        assert_eq!(value["accountNumber"], "KSP2612345678");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("id_number").is_none());
        assert!(value.get("account_number").is_none());

        let back: Customer = serde_json::from_value(value).unwrap();
        assert_eq!(back, customer);
    }
}
