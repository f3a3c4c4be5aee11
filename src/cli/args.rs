use crate::config::LedgerPolicy;
use crate::core::PageRequest;
use crate::types::CustomerStatus;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use uuid::Uuid;

/// Cooperative savings ledger
#[derive(Parser, Debug)]
#[command(name = "koperasi")]
#[command(about = "Cooperative savings ledger: deposits, transfers, profit sharing and fees", long_about = None)]
pub struct CliArgs {
    /// Ledger file; an in-memory ledger is used when absent
    #[arg(long = "ledger", env = "KOPERASI_LEDGER", value_name = "FILE", global = true)]
    pub ledger: Option<PathBuf>,

    /// Username recorded in the logs for mutating commands
    #[arg(long = "operator", env = "KOPERASI_OPERATOR", default_value = "admin", global = true)]
    pub operator: String,

    #[command(flatten)]
    pub policy: PolicyArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Business policy overrides
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Customers below this balance after an admin fee are deactivated
    #[arg(long = "admin-fee-floor", env = "KOPERASI_ADMIN_FEE_FLOOR", global = true)]
    pub admin_fee_floor: Option<Decimal>,

    /// Smallest opening balance accepted at registration
    #[arg(long = "min-initial-balance", env = "KOPERASI_MIN_INITIAL_BALANCE", global = true)]
    pub min_initial_balance: Option<Decimal>,

    /// Balance below which a deactivation writes off the remainder
    #[arg(long = "dust-threshold", env = "KOPERASI_DUST_THRESHOLD", global = true)]
    pub dust_threshold: Option<Decimal>,

    /// Maximum results of `search`
    #[arg(long = "search-limit", env = "KOPERASI_SEARCH_LIMIT", global = true)]
    pub search_limit: Option<usize>,

    /// Attempts before receipt generation gives up
    #[arg(long = "receipt-attempts", env = "KOPERASI_RECEIPT_ATTEMPTS", global = true)]
    pub receipt_attempts: Option<usize>,
}

impl PolicyArgs {
    /// Build the engine policy, falling back to defaults for unset values
    ///
    /// Zero search limits and attempt counts are ignored.
    pub fn to_policy(&self) -> LedgerPolicy {
        let mut policy = LedgerPolicy::default();
        if let Some(floor) = self.admin_fee_floor {
            policy = policy.with_admin_fee_floor(floor);
        }
        if let Some(minimum) = self.min_initial_balance {
            policy = policy.with_minimum_initial_balance(minimum);
        }
        if let Some(threshold) = self.dust_threshold {
            policy.deactivation_dust_threshold = threshold;
        }
        if let Some(limit) = self.search_limit.filter(|limit| *limit > 0) {
            policy.search_limit = limit;
        }
        if let Some(attempts) = self.receipt_attempts.filter(|attempts| *attempts > 0) {
            policy.receipt_max_attempts = attempts;
        }
        policy
    }
}

/// Client-supplied idempotency key; a fresh one is minted when absent
#[derive(Args, Debug, Clone)]
pub struct KeyArg {
    #[arg(long = "idempotency-key", value_name = "UUID")]
    pub idempotency_key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long = "per-page", default_value_t = 10)]
    pub per_page: usize,
}

impl PageArgs {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: String,

    /// 16-digit national identity number
    #[arg(long = "id-number")]
    pub id_number: String,

    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub phone: String,

    /// MALE or FEMALE
    #[arg(long)]
    pub gender: String,

    /// YYYY-MM-DD
    #[arg(long = "birth-date")]
    pub birth_date: String,
}

#[derive(Args, Debug, Clone)]
pub struct CashArgs {
    #[arg(long = "customer")]
    pub customer_id: String,

    #[arg(long)]
    pub amount: String,

    #[arg(long)]
    pub notes: Option<String>,

    #[command(flatten)]
    pub key: KeyArg,
}

#[derive(Args, Debug, Clone)]
pub struct MainCashArgs {
    #[arg(long)]
    pub amount: String,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub notes: Option<String>,

    #[command(flatten)]
    pub key: KeyArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for CustomerStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => CustomerStatus::Active,
            StatusArg::Inactive => CustomerStatus::Inactive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    ProfitSharing,
    AdminFee,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a customer with an opening deposit
    Register {
        #[command(flatten)]
        profile: ProfileArgs,

        #[arg(long = "initial-balance")]
        initial_balance: String,

        #[command(flatten)]
        key: KeyArg,
    },

    /// Replace a customer's profile fields
    UpdateProfile {
        #[arg(long = "customer")]
        customer_id: Uuid,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Cash deposit into a customer account
    Deposit(CashArgs),

    /// Cash withdrawal from a customer account
    Withdraw(CashArgs),

    /// Transfer between customers
    Transfer {
        #[arg(long = "from")]
        source_customer_id: String,

        /// Destination account number
        #[arg(long = "to")]
        destination_account_number: String,

        #[arg(long)]
        amount: String,

        #[arg(long)]
        notes: Option<String>,

        #[command(flatten)]
        key: KeyArg,
    },

    /// Deactivate a customer with a (near) zero balance
    Deactivate {
        #[arg(long = "customer")]
        customer_id: Uuid,
    },

    /// Reactivate an inactive customer
    Activate {
        #[arg(long = "customer")]
        customer_id: Uuid,
    },

    /// Find active customers by name or account number
    Search { query: String },

    /// List customers
    Customers {
        #[arg(long)]
        query: Option<String>,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[command(flatten)]
        page: PageArgs,

        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Ledger lines of one customer
    History {
        #[arg(long = "customer")]
        customer_id: Uuid,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Ledger lines of the main account
    MainHistory {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Add operational cash to the main account
    TopUp(MainCashArgs),

    /// Take operational cash out of the main account
    WithdrawMain(MainCashArgs),

    /// Current main-account balance
    Balance,

    /// Preview a profit-sharing run
    ProfitSharePreview {
        #[arg(long = "total")]
        total_amount: Decimal,
    },

    /// Distribute an amount evenly to all active customers
    ProfitShare {
        #[arg(long = "total")]
        total_amount: String,

        #[command(flatten)]
        key: KeyArg,
    },

    /// Preview an admin-fee run
    AdminFeePreview {
        #[arg(long = "amount")]
        amount_per_customer: Decimal,
    },

    /// Charge an admin fee to every active customer who can pay it
    AdminFee {
        #[arg(long = "amount")]
        amount_per_customer: String,

        #[arg(long)]
        description: String,

        #[command(flatten)]
        key: KeyArg,
    },

    /// History of bulk runs
    Events {
        #[arg(value_enum)]
        kind: EventKind,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Detail of one bulk run with its customer lines
    Event {
        #[arg(value_enum)]
        kind: EventKind,

        id: Uuid,
    },

    /// Account statement over a date range
    Statement {
        #[arg(long = "customer")]
        customer_id: Uuid,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Record the main-account balance for a day (today by default)
    Snapshot {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Dashboard figures over a date range
    Dashboard {
        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::defaults(&["koperasi", "balance"], Decimal::new(50_000, 0), 10)]
    #[case::custom_floor(
        &["koperasi", "--admin-fee-floor", "25000", "balance"],
        Decimal::new(25_000, 0),
        10
    )]
    #[case::flag_after_subcommand(
        &["koperasi", "balance", "--search-limit", "25"],
        Decimal::new(50_000, 0),
        25
    )]
    #[case::zero_limit_ignored(&["koperasi", "--search-limit", "0", "balance"], Decimal::new(50_000, 0), 10)]
    fn test_policy_conversion(
        #[case] args: &[&str],
        #[case] expected_floor: Decimal,
        #[case] expected_limit: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let policy = parsed.policy.to_policy();
        assert_eq!(policy.admin_fee_deactivation_floor, expected_floor);
        assert_eq!(policy.search_limit, expected_limit);
    }

    #[test]
    fn test_deposit_parsing() {
        let parsed = CliArgs::try_parse_from([
            "koperasi",
            "--ledger",
            "ledger.json",
            "deposit",
            "--customer",
            "5f0c7a64-8f7e-4d1a-9a53-0c2b1f1e8d11",
            "--amount",
            "25000",
            "--idempotency-key",
            "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
        ])
        .unwrap();

        assert_eq!(parsed.ledger, Some(PathBuf::from("ledger.json")));
        match parsed.command {
            Command::Deposit(cash) => {
                assert_eq!(cash.amount, "25000");
                assert_eq!(cash.notes, None);
                assert_eq!(
                    cash.key.idempotency_key.as_deref(),
                    Some("9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d")
                );
            }
            other => panic!("Expected deposit, got {:?}", other),
        }
    }

    #[rstest]
    #[case::profit_sharing(&["koperasi", "events", "profit-sharing"], EventKind::ProfitSharing)]
    #[case::admin_fee(&["koperasi", "events", "admin-fee", "--page", "2"], EventKind::AdminFee)]
    fn test_event_kind_parsing(#[case] args: &[&str], #[case] expected: EventKind) {
        match CliArgs::try_parse_from(args).unwrap().command {
            Command::Events { kind, .. } => assert_eq!(kind, expected),
            other => panic!("Expected events, got {:?}", other),
        }
    }

    #[rstest]
    #[case::missing_subcommand(&["koperasi"])]
    #[case::bad_customer_id(&["koperasi", "deactivate", "--customer", "42"])]
    #[case::bad_date(&["koperasi", "dashboard", "--from", "2026-13-01", "--to", "2026-12-31"])]
    #[case::missing_description(&["koperasi", "admin-fee", "--amount", "5000"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
