//! Idempotency guard
//!
//! Every mutating operation carries a caller-minted key. The key is checked
//! and inserted inside the same store transaction as the operation's other
//! writes, so it only counts as used once the whole operation commits, and
//! a second attempt with the same key sees it and aborts.

use crate::store::StoreTx;
use crate::types::LedgerError;
use std::fmt;
use uuid::Uuid;

/// Caller-supplied idempotency token (a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Parse a key, rejecting anything that is not a UUID
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        Uuid::parse_str(raw.trim())
            .map(IdempotencyKey)
            .map_err(|_| LedgerError::invalid("idempotencyKey", "Kunci idempotensi tidak valid."))
    }

    /// Mint a fresh key for a new logical intent
    pub fn generate() -> Self {
        IdempotencyKey(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<Uuid> for IdempotencyKey {
    fn from(uuid: Uuid) -> Self {
        IdempotencyKey(uuid)
    }
}

/// Reserve `key` inside the current transaction
///
/// # Errors
///
/// `DuplicateExecution` if the key belongs to an already committed (or
/// earlier in this transaction) operation. The caller must abort the
/// transaction so nothing else is written.
pub fn reserve(tx: &mut StoreTx<'_>, key: &IdempotencyKey) -> Result<(), LedgerError> {
    let key = key.to_string();
    if tx.has_idempotency_key(&key) {
        return Err(LedgerError::DuplicateExecution { key });
    }
    tx.insert_idempotency_key(&key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LedgerStore;

    #[test]
    fn test_parse_accepts_uuid() {
        let raw = "6f1c2a6e-2f7b-4c55-9d7e-1b0c8a4f1e22";
        let key = IdempotencyKey::parse(raw).unwrap();
        assert_eq!(key.to_string(), raw);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = IdempotencyKey::parse("not-a-key").unwrap_err();
        match err {
            LedgerError::Validation(fields) => assert!(fields.contains_key("idempotencyKey")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_second_reservation_is_duplicate() {
        let store = LedgerStore::in_memory();
        let key = IdempotencyKey::generate();

        store
            .transaction(|tx| reserve(tx, &key))
            .unwrap();
        let err = store.transaction(|tx| reserve(tx, &key)).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateExecution { .. }));
    }

    #[test]
    fn test_aborted_transaction_leaves_key_unused() {
        let store = LedgerStore::in_memory();
        let key = IdempotencyKey::generate();

        let aborted = store.transaction(|tx| -> Result<(), LedgerError> {
            reserve(tx, &key)?;
            Err(LedgerError::SelfTransfer)
        });
        assert!(aborted.is_err());

        assert!(store.transaction(|tx| reserve(tx, &key)).is_ok());
    }
}
