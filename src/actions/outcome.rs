//! Discriminated result returned to the presentation layer

use crate::types::{FieldErrors, LedgerError};
use rust_decimal::Decimal;
use serde::Serialize;

pub const DUPLICATE_MESSAGE: &str = "Proses berhasil. Permintaan duplikat diabaikan.";
pub const INVALID_MESSAGE: &str = "Gagal memproses. Data yang dimasukkan tidak valid.";
pub const SYSTEM_ERROR_MESSAGE: &str = "Terjadi kesalahan sistem. Operasi gagal.";

/// Echo data for confirmation messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

/// What an action reports back
///
/// Nothing past this boundary is an error value: every failure is folded
/// into `ValidationError` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Success {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ActionData>,
    },
    ValidationError {
        message: String,
        errors: FieldErrors,
    },
    Error {
        message: String,
    },
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>, data: ActionData) -> Self {
        ActionOutcome::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Success reported for a request whose key was already used
    pub fn duplicate() -> Self {
        ActionOutcome::Success {
            message: DUPLICATE_MESSAGE.to_string(),
            data: None,
        }
    }

    pub fn invalid(errors: FieldErrors) -> Self {
        ActionOutcome::ValidationError {
            message: INVALID_MESSAGE.to_string(),
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ActionOutcome::Success { message, .. }
            | ActionOutcome::ValidationError { message, .. }
            | ActionOutcome::Error { message } => message,
        }
    }
}

impl From<LedgerError> for ActionOutcome {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Validation(errors) => ActionOutcome::invalid(errors),
            LedgerError::DuplicateExecution { .. } => ActionOutcome::duplicate(),
            // Detail was logged by the engine; never shown to the caller.
            LedgerError::Store(_) => ActionOutcome::Error {
                message: SYSTEM_ERROR_MESSAGE.to_string(),
            },
            other => ActionOutcome::Error {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoreError;
    use serde_json::json;

    #[test]
    fn test_store_error_is_generic() {
        let outcome = ActionOutcome::from(LedgerError::Store(StoreError::Io {
            path: "/var/lib/koperasi/ledger.json".to_string(),
            message: "disk full".to_string(),
        }));
        assert_eq!(outcome.message(), SYSTEM_ERROR_MESSAGE);
        assert!(!outcome.message().contains("disk"));
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = ActionOutcome::success(
            "Simpanan berhasil ditambahkan.",
            ActionData {
                amount: Some(Decimal::new(50_000, 0)),
                customer_name: Some("Siti".to_string()),
                ..ActionData::default()
            },
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": "success",
                "message": "Simpanan berhasil ditambahkan.",
                "data": { "amount": "50000", "customerName": "Siti" }
            })
        );

        let invalid = ActionOutcome::from(LedgerError::invalid("amount", "Jumlah harus lebih dari nol."));
        assert_eq!(
            serde_json::to_value(&invalid).unwrap(),
            json!({
                "status": "validation_error",
                "message": INVALID_MESSAGE,
                "errors": { "amount": ["Jumlah harus lebih dari nol."] }
            })
        );
    }

    #[test]
    fn test_business_refusal_keeps_message() {
        let outcome = ActionOutcome::from(LedgerError::SelfTransfer);
        assert_eq!(
            outcome,
            ActionOutcome::Error {
                message: "Tidak bisa transfer ke rekening sendiri.".to_string()
            }
        );
    }
}
