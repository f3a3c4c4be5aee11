//! Koperasi Ledger Library
//! # Overview
//!
//! Ledger and money-movement engine of a savings-and-loan cooperative
//! (koperasi simpan pinjam). Every operation that moves money commits as
//! one atomic transaction together with its idempotency key.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Customer, Transaction, events, errors)
//! - [`store`] - Transactional storage with an optional JSON file behind it
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - The transactional-operation pattern
//!   - [`core::customers`] - Registration, cash movements, transfers, status
//!   - [`core::main_account`] - The cooperative's operational cash
//!   - [`core::profit_sharing`] - Even distribution with a floor split
//!   - [`core::admin_fee`] - Fee runs with automatic deactivation
//!   - [`core::reports`] - Listings, histories, statements, dashboard
//! - [`actions`] - Form parsing and outcome mapping for front ends
//! - [`io`] - CSV export
//! - [`cli`] - CLI arguments and dispatch
//! - [`config`] - Business policy inputs
//!
//! # Ledgers
//!
//! Two ledgers are kept:
//!
//! - **Customer ledger**: one line per balance change of a customer
//! - **Main-account ledger**: the cooperative's operational cash
//!
//! Cash deposits and withdrawals touch both; transfers touch only the
//! customer ledger. A customer's balance always equals the signed sum of
//! their ledger lines, and receipt numbers are unique across both ledgers.

pub mod actions;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod store;
pub mod types;

pub use actions::{ActionOutcome, LedgerActions, Operator};
pub use config::LedgerPolicy;
pub use core::{AsyncLedgerEngine, Execution, IdempotencyKey, LedgerEngine};
pub use io::{write_customers_csv, write_statement_csv};
pub use store::LedgerStore;
pub use types::{
    Customer, CustomerId, CustomerStatus, LedgerError, MainAccount, MainAccountTransaction,
    StoreError, Transaction,
};
