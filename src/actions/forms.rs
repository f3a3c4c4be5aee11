//! Raw form submissions and their typed counterparts
//!
//! Every field arrives as text. `parse` coerces the whole form at once and
//! returns either a typed input or every field error found.

use super::validation::FormValidator;
use crate::core::IdempotencyKey;
use crate::types::{CustomerId, CustomerProfile, FieldErrors};
use rust_decimal::Decimal;
use serde::Deserialize;

const BIRTH_DATE_MESSAGE: &str = "Tanggal lahir tidak valid.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub name: String,
    pub id_number: String,
    pub address: String,
    pub phone: String,
    pub gender: String,
    pub birth_date: String,
}

impl ProfileForm {
    fn coerce(&self, validator: &mut FormValidator) -> Option<CustomerProfile> {
        let gender = validator.gender(&self.gender);
        let birth_date = validator.date("birthDate", &self.birth_date, BIRTH_DATE_MESSAGE);
        Some(CustomerProfile {
            name: self.name.trim().to_string(),
            id_number: self.id_number.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            gender: gender?,
            birth_date: birth_date?,
        })
    }

    pub fn parse(&self) -> Result<CustomerProfile, FieldErrors> {
        let mut validator = FormValidator::new();
        match self.coerce(&mut validator) {
            Some(profile) if validator.is_valid() => Ok(profile),
            _ => Err(validator.into_errors()),
        }
    }
}

/// Registration: profile plus opening balance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub idempotency_key: String,
    #[serde(flatten)]
    pub profile: ProfileForm,
    pub initial_balance: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInput {
    pub key: IdempotencyKey,
    pub profile: CustomerProfile,
    pub initial_balance: Decimal,
}

impl CustomerForm {
    pub fn parse(&self) -> Result<RegisterInput, FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let profile = self.profile.coerce(&mut validator);
        let initial_balance = validator.amount("initialBalance", &self.initial_balance);

        match (key, profile, initial_balance) {
            (Some(key), Some(profile), Some(initial_balance)) if validator.is_valid() => {
                Ok(RegisterInput {
                    key,
                    profile,
                    initial_balance,
                })
            }
            _ => Err(validator.into_errors()),
        }
    }
}

/// Deposit or withdrawal at the teller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashForm {
    pub idempotency_key: String,
    pub customer_id: String,
    pub amount: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashInput {
    pub key: IdempotencyKey,
    pub customer_id: CustomerId,
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl CashForm {
    pub fn parse(&self) -> Result<CashInput, FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let customer_id = validator.id("customerId", &self.customer_id);
        let amount = validator.amount("amount", &self.amount);

        match (key, customer_id, amount) {
            (Some(key), Some(customer_id), Some(amount)) if validator.is_valid() => Ok(CashInput {
                key,
                customer_id,
                amount,
                notes: self.notes.clone(),
            }),
            _ => Err(validator.into_errors()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferForm {
    pub idempotency_key: String,
    pub source_customer_id: String,
    pub destination_account_number: String,
    pub amount: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferInput {
    pub key: IdempotencyKey,
    pub source_customer_id: CustomerId,
    pub destination_account_number: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl TransferForm {
    pub fn parse(&self) -> Result<TransferInput, FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let source_customer_id = validator.id("sourceCustomerId", &self.source_customer_id);
        let destination_account_number = validator.text(
            "destinationAccountNumber",
            &self.destination_account_number,
            1,
            None,
            "Nomor rekening tujuan wajib diisi.",
        );
        let amount = validator.amount("amount", &self.amount);

        match (key, source_customer_id, destination_account_number, amount) {
            (Some(key), Some(source_customer_id), Some(destination_account_number), Some(amount))
                if validator.is_valid() =>
            {
                Ok(TransferInput {
                    key,
                    source_customer_id,
                    destination_account_number,
                    amount,
                    notes: self.notes.clone(),
                })
            }
            _ => Err(validator.into_errors()),
        }
    }
}

/// Top-up or withdrawal of operational cash
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainAccountForm {
    pub idempotency_key: String,
    pub amount: String,
    pub description: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainAccountInput {
    pub key: IdempotencyKey,
    pub amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
}

impl MainAccountForm {
    pub fn parse(&self) -> Result<MainAccountInput, FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let amount = validator.amount("amount", &self.amount);
        let description = validator.text("description", &self.description, 3, None, "Deskripsi wajib diisi.");

        match (key, amount, description) {
            (Some(key), Some(amount), Some(description)) if validator.is_valid() => {
                Ok(MainAccountInput {
                    key,
                    amount,
                    description,
                    notes: self.notes.clone(),
                })
            }
            _ => Err(validator.into_errors()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfitSharingForm {
    pub idempotency_key: String,
    pub total_amount: String,
}

impl ProfitSharingForm {
    pub fn parse(&self) -> Result<(IdempotencyKey, Decimal), FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let total_amount = validator.amount("totalAmount", &self.total_amount);

        match (key, total_amount) {
            (Some(key), Some(total_amount)) if validator.is_valid() => Ok((key, total_amount)),
            _ => Err(validator.into_errors()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminFeeForm {
    pub idempotency_key: String,
    pub amount_per_customer: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminFeeInput {
    pub key: IdempotencyKey,
    pub amount_per_customer: Decimal,
    pub description: String,
}

impl AdminFeeForm {
    pub fn parse(&self) -> Result<AdminFeeInput, FieldErrors> {
        let mut validator = FormValidator::new();
        let key = validator.idempotency_key(&self.idempotency_key);
        let amount_per_customer = validator.amount("amountPerCustomer", &self.amount_per_customer);
        let description = validator.text(
            "description",
            &self.description,
            3,
            Some(100),
            "Deskripsi harus 3 sampai 100 karakter.",
        );

        match (key, amount_per_customer, description) {
            (Some(key), Some(amount_per_customer), Some(description)) if validator.is_valid() => {
                Ok(AdminFeeInput {
                    key,
                    amount_per_customer,
                    description,
                })
            }
            _ => Err(validator.into_errors()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_cash_form_reports_every_field() {
        let form = CashForm {
            idempotency_key: "not-a-uuid".to_string(),
            customer_id: String::new(),
            amount: "-5".to_string(),
            notes: None,
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains_key("idempotencyKey"));
        assert!(errors.contains_key("customerId"));
        assert_eq!(errors["amount"], vec!["Jumlah harus lebih dari nol.".to_string()]);
    }

    #[test]
    fn test_customer_form_from_json() {
        let form: CustomerForm = serde_json::from_value(json!({
            "idempotencyKey": "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
            "name": "  Siti Aminah ",
            "idNumber": "3201010101010001",
            "address": "Jl. Merdeka No. 10, Bandung",
            "phone": "081234567890",
            "gender": "FEMALE",
            "birthDate": "1990-05-17",
            "initialBalance": "50000"
        }))
        .unwrap();

        let input = form.parse().unwrap();
        assert_eq!(input.profile.name, "Siti Aminah");
        assert_eq!(input.profile.gender, Gender::Female);
        assert_eq!(input.profile.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
        assert_eq!(input.initial_balance, Decimal::new(50_000, 0));
    }

    #[test]
    fn test_admin_fee_description_bounds() {
        let form = AdminFeeForm {
            idempotency_key: IdempotencyKey::generate().to_string(),
            amount_per_customer: "5000".to_string(),
            description: "x".repeat(101),
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["description"]);
    }
}
