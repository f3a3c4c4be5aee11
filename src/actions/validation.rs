//! Coercion of raw form fields into typed inputs
//!
//! Every field is checked and every failure is kept, keyed by field name, so
//! the caller can show all problems at once.

use crate::core::IdempotencyKey;
use crate::types::{money, FieldErrors, Gender};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Collects field errors while parsing a form
#[derive(Debug, Default)]
pub struct FormValidator {
    errors: FieldErrors,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn idempotency_key(&mut self, raw: &str) -> Option<IdempotencyKey> {
        match IdempotencyKey::parse(raw) {
            Ok(key) => Some(key),
            Err(_) => {
                self.fail("idempotencyKey", "Kunci idempotensi tidak valid.");
                None
            }
        }
    }

    pub fn id(&mut self, field: &str, raw: &str) -> Option<Uuid> {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                self.fail(field, "ID tidak valid.");
                None
            }
        }
    }

    /// A positive amount with at most two decimal places
    pub fn amount(&mut self, field: &str, raw: &str) -> Option<Decimal> {
        let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
        match Decimal::from_str(&cleaned) {
            Ok(amount) if amount <= Decimal::ZERO => {
                self.fail(field, "Jumlah harus lebih dari nol.");
                None
            }
            Ok(amount) if !money::has_money_precision(amount) => {
                self.fail(field, "Jumlah tidak boleh lebih dari dua angka desimal.");
                None
            }
            Ok(amount) => Some(amount),
            Err(_) => {
                self.fail(field, "Jumlah harus berupa angka.");
                None
            }
        }
    }

    /// Trimmed text of at least `min` and at most `max` characters
    pub fn text(&mut self, field: &str, raw: &str, min: usize, max: Option<usize>, message: &str) -> Option<String> {
        let value = raw.trim();
        let chars = value.chars().count();
        if chars < min || max.is_some_and(|max| chars > max) {
            self.fail(field, message);
            return None;
        }
        Some(value.to_string())
    }

    pub fn gender(&mut self, raw: &str) -> Option<Gender> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            _ => {
                self.fail("gender", "Jenis kelamin harus dipilih.");
                None
            }
        }
    }

    /// Calendar date in `YYYY-MM-DD`
    pub fn date(&mut self, field: &str, raw: &str, message: &str) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.fail(field, message);
                None
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("50000", Some(Decimal::new(50_000, 0)))]
    #[case(" 1_000.50 ", Some(Decimal::new(100_050, 2)))]
    #[case("0", None)]
    #[case("-10", None)]
    #[case("1.001", None)]
    #[case("sepuluh", None)]
    fn test_amount(#[case] raw: &str, #[case] expected: Option<Decimal>) {
        let mut validator = FormValidator::new();
        assert_eq!(validator.amount("amount", raw), expected);
        assert_eq!(validator.is_valid(), expected.is_some());
    }

    #[test]
    fn test_collects_every_failure() {
        let mut validator = FormValidator::new();
        validator.idempotency_key("nope");
        validator.gender("X");
        validator.text("description", "ab", 3, Some(100), "Deskripsi wajib diisi.");

        let errors = validator.into_errors();
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["description", "gender", "idempotencyKey"]
        );
    }

    #[rstest]
    #[case("male", Some(Gender::Male))]
    #[case("FEMALE", Some(Gender::Female))]
    #[case("", None)]
    fn test_gender(#[case] raw: &str, #[case] expected: Option<Gender>) {
        assert_eq!(FormValidator::new().gender(raw), expected);
    }
}
