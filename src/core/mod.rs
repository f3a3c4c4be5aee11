//! Core business logic module
//!
//! This module contains the ledger engine and its building blocks:
//! - `engine` - The shared transactional-operation pattern
//! - `idempotency` - Key reservation inside the operation's transaction
//! - `receipt` - Unique receipt and account number generation
//! - `posting` - Balance changes paired with their ledger lines
//! - `customers`, `main_account` - Everyday money movements
//! - `profit_sharing`, `admin_fee` - Bulk distribution and collection
//! - `reports` - Read-side queries
//! - `cache` - Views invalidated by commit summaries
//! - `traits` - The clock abstraction
//! - `async` - Async facade over the engine

pub mod admin_fee;
pub mod r#async;
pub mod cache;
pub mod customers;
pub mod engine;
pub mod idempotency;
pub mod main_account;
pub mod posting;
pub mod profit_sharing;
pub mod receipt;
pub mod reports;
pub mod traits;

pub use admin_fee::{AdminFeeCollection, AdminFeePreview};
pub use cache::{CustomerSummary, ViewCache};
pub use customers::{CashMovement, Deactivation, TransferReceipt};
pub use engine::{Execution, LedgerEngine};
pub use idempotency::IdempotencyKey;
pub use main_account::MainAccountMovement;
pub use profit_sharing::ProfitSharingPreview;
pub use r#async::AsyncLedgerEngine;
pub use receipt::{ReceiptGenerator, ReceiptPrefix};
pub use reports::{
    AdminFeeDetail, CustomerFilter, DashboardStats, DateRange, EventLine, Page, PageRequest,
    ProfitSharingDetail, Statement,
};
pub use traits::{Clock, FixedClock, SystemClock};
