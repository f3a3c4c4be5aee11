//! Asynchronous access to the ledger engine
//!
//! Async callers (request handlers) share one engine through
//! [`AsyncLedgerEngine`], which moves each synchronous operation onto
//! tokio's blocking pool. Consistency still comes from the store's
//! transaction boundary alone.

pub mod engine;

pub use engine::AsyncLedgerEngine;
