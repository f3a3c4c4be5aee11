//! CSV export of statements and customer listings
//!
//! This module centralizes all CSV format concerns:
//! - Statement lines with a running balance
//! - Customer summaries for listing exports
//!
//! Functions write to any `Write`, so tests can capture output in memory.

use crate::core::{CustomerSummary, Statement};
use csv::Writer;
use std::io::Write;

const STATEMENT_HEADER: [&str; 7] = [
    "date",
    "receipt_number",
    "description",
    "type",
    "amount",
    "balance",
    "notes",
];

/// Write a statement as CSV
///
/// The first row after the header carries the opening balance; each ledger
/// line follows with the balance after it was applied.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_statement_csv(statement: &Statement, output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(STATEMENT_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    writer
        .write_record([
            statement.from.format("%Y-%m-%d").to_string(),
            String::new(),
            "SALDO AWAL".to_string(),
            String::new(),
            String::new(),
            format!("{:.2}", statement.opening_balance),
            String::new(),
        ])
        .map_err(|e| format!("Failed to write opening balance: {}", e))?;

    let mut balance = statement.opening_balance;
    for line in &statement.transactions {
        balance += line.entry_type.signed(line.amount);
        writer
            .write_record([
                line.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                line.receipt_number.clone(),
                line.description.clone(),
                line.entry_type.as_str().to_string(),
                format!("{:.2}", line.amount),
                format!("{:.2}", balance),
                line.notes.clone().unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write statement line {}: {}", line.receipt_number, e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write customer summaries as CSV, sorted by account number
pub fn write_customers_csv(customers: &[CustomerSummary], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account_number", "name", "balance", "status"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&CustomerSummary> = customers.iter().collect();
    sorted.sort_by(|a, b| a.account_number.cmp(&b.account_number));

    for customer in sorted {
        writer
            .write_record([
                customer.account_number.clone(),
                customer.name.clone(),
                format!("{:.2}", customer.balance),
                customer.status.as_str().to_string(),
            ])
            .map_err(|e| format!("Failed to write customer record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
