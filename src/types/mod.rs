//! Types module
//!
//! Contains core data structures used throughout the ledger:
//! - `customer`: Customer profile, status and financial state
//! - `transaction`: Ledger lines, the main account and identifiers
//! - `event`: Profit-sharing and admin-fee history records
//! - `money`: Fixed-point money helpers and the even-split rule
//! - `error`: Error types for ledger operations

pub mod customer;
pub mod error;
pub mod event;
pub mod money;
pub mod transaction;

pub use customer::{Customer, CustomerProfile, CustomerStatus, Gender};
pub use error::{BulkOperation, FieldErrors, FundsSource, LedgerError, StoreError};
pub use event::{AdminFeeEvent, ProfitSharingEvent};
pub use money::{split_evenly, EvenSplit};
pub use transaction::{
    CustomerId, DailyBalanceSnapshot, EntryType, EventId, EventLink, MainAccount,
    MainAccountTransaction, PostingSource, Transaction, TransactionId, MAIN_ACCOUNT_ID,
};
