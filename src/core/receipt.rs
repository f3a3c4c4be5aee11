//! Receipt and account number generation
//!
//! Receipt numbers are a family prefix followed by random decimal digits.
//! Both ledgers share one namespace, so a candidate is only accepted once it
//! is absent from the customer ledger and the main-account ledger (including
//! lines staged earlier in the same transaction). Randomness keeps
//! collisions rare; the existence check is what guarantees uniqueness.

use crate::store::StoreTx;
use crate::types::StoreError;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use std::fmt;
use tracing::debug;

/// Operation family encoded at the front of a receipt number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptPrefix {
    /// Credits to a customer: deposits, opening balances, profit sharing
    Deposit,
    /// Debits from a customer: withdrawals, admin fees, write-offs
    Withdrawal,
    /// Both legs of a customer-to-customer transfer
    Transfer,
    /// Lines of the main-account ledger
    MainAccount,
}

impl ReceiptPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptPrefix::Deposit => "SP",
            ReceiptPrefix::Withdrawal => "TR",
            ReceiptPrefix::Transfer => "TF",
            ReceiptPrefix::MainAccount => "IK",
        }
    }
}

impl fmt::Display for ReceiptPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded-retry generator of unique reference codes
#[derive(Debug, Clone, Copy)]
pub struct ReceiptGenerator {
    customer_digits: u32,
    main_digits: u32,
    max_attempts: usize,
}

const ACCOUNT_PREFIX: &str = "KSP";
const ACCOUNT_RANDOM_MIN: u32 = 10_000_000;
const ACCOUNT_RANDOM_MAX: u32 = 99_999_999;

impl ReceiptGenerator {
    pub fn new(customer_digits: u32, main_digits: u32, max_attempts: usize) -> Self {
        ReceiptGenerator {
            customer_digits,
            main_digits,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Receipt number for a customer ledger line
    pub fn customer_receipt<R: Rng + ?Sized>(
        &self,
        tx: &StoreTx<'_>,
        rng: &mut R,
        prefix: ReceiptPrefix,
    ) -> Result<String, StoreError> {
        self.generate(tx, rng, prefix, self.customer_digits)
    }

    /// Receipt number for a main-account ledger line
    pub fn main_receipt<R: Rng + ?Sized>(
        &self,
        tx: &StoreTx<'_>,
        rng: &mut R,
    ) -> Result<String, StoreError> {
        self.generate(tx, rng, ReceiptPrefix::MainAccount, self.main_digits)
    }

    /// Generate `prefix` + `digits` random digits, unused in both ledgers
    ///
    /// # Errors
    ///
    /// `KeySpaceExhausted` after `max_attempts` consecutive collisions.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        tx: &StoreTx<'_>,
        rng: &mut R,
        prefix: ReceiptPrefix,
        digits: u32,
    ) -> Result<String, StoreError> {
        let width = digits as usize;
        let upper = 10u64.checked_pow(digits).unwrap_or(u64::MAX);

        for attempt in 1..=self.max_attempts {
            let candidate = format!("{}{:0width$}", prefix, rng.gen_range(0..upper), width = width);
            if !tx.transaction_receipt_exists(&candidate)
                && !tx.main_transaction_receipt_exists(&candidate)
            {
                return Ok(candidate);
            }
            debug!(receipt = %candidate, attempt, "receipt number collision, regenerating");
        }

        Err(StoreError::KeySpaceExhausted {
            kind: "receipt number",
            attempts: self.max_attempts,
        })
    }

    /// Account number `KSP` + two-digit year + eight random digits
    pub fn account_number<R: Rng + ?Sized>(
        &self,
        tx: &StoreTx<'_>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let year = now.year().rem_euclid(100);
        for _ in 0..self.max_attempts {
            let candidate = format!(
                "{}{:02}{}",
                ACCOUNT_PREFIX,
                year,
                rng.gen_range(ACCOUNT_RANDOM_MIN..=ACCOUNT_RANDOM_MAX)
            );
            if tx.customer_by_account_number(&candidate).is_none() {
                return Ok(candidate);
            }
            debug!(account_number = %candidate, "account number collision, regenerating");
        }

        Err(StoreError::KeySpaceExhausted {
            kind: "account number",
            attempts: self.max_attempts,
        })
    }
}
