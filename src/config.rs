//! Engine configuration
//!
//! Policy constants of the cooperative (fee deactivation floor, dust
//! write-off threshold, minimum opening balance, ...) are inputs to the
//! engine rather than literals, so the CLI and tests can set them.

use rust_decimal::Decimal;

/// Business policy applied by the ledger engine
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPolicy {
    /// Customers charged an admin fee whose balance falls below this are
    /// deactivated by the same run
    pub admin_fee_deactivation_floor: Decimal,

    /// Deactivation requires a balance strictly below this; whatever is
    /// left is written off to exactly zero
    pub deactivation_dust_threshold: Decimal,

    /// Smallest opening balance accepted at registration
    pub minimum_initial_balance: Decimal,

    /// Maximum results of the transfer-destination search
    pub search_limit: usize,

    /// Attempts before receipt/account number generation gives up
    pub receipt_max_attempts: usize,

    /// Random digits in receipt numbers of customer ledger lines
    pub customer_receipt_digits: u32,

    /// Random digits in receipt numbers of main-account ledger lines
    pub main_receipt_digits: u32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        LedgerPolicy {
            admin_fee_deactivation_floor: Decimal::new(50_000, 0),
            deactivation_dust_threshold: Decimal::ONE,
            minimum_initial_balance: Decimal::new(50_000, 0),
            search_limit: 10,
            receipt_max_attempts: 1024,
            customer_receipt_digits: 7,
            main_receipt_digits: 5,
        }
    }
}

impl LedgerPolicy {
    /// Builder-style override of the admin-fee floor
    pub fn with_admin_fee_floor(mut self, floor: Decimal) -> Self {
        self.admin_fee_deactivation_floor = floor;
        self
    }

    /// Builder-style override of the registration minimum
    pub fn with_minimum_initial_balance(mut self, minimum: Decimal) -> Self {
        self.minimum_initial_balance = minimum;
        self
    }
}
