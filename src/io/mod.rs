//! I/O module
//!
//! Handles CSV output.
//!
//! # Components
//!
//! - `csv_format` - Statement and customer-list serialization

pub mod csv_format;

pub use csv_format::{write_customers_csv, write_statement_csv};
