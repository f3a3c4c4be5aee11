//! Koperasi ledger CLI
//!
//! Command-line front end for the cooperative ledger.
//!
//! # Usage
//!
//! ```bash
//! koperasi --ledger ledger.json top-up --amount 1000000 --description "Modal awal"
//! koperasi --ledger ledger.json register --name "Siti Aminah" --id-number 3201010101010001 \
//!     --address "Jl. Merdeka No. 10, Bandung" --phone 081234567890 --gender FEMALE \
//!     --birth-date 1990-05-17 --initial-balance 50000
//! koperasi --ledger ledger.json profit-share --total 250000
//! koperasi --ledger ledger.json statement --customer <ID> --from 2026-01-01 --to 2026-01-31 --csv
//! ```
//!
//! Results are written to stdout as JSON (or CSV with `--csv`). Logs go to
//! stderr and are filtered with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Refused or failed (the outcome on stdout says why), or the ledger
//!   file could not be opened

use std::process;
use std::sync::Arc;

use anyhow::Context;
use koperasi_ledger::cli;
use koperasi_ledger::core::LedgerEngine;
use koperasi_ledger::store::LedgerStore;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = cli::parse_args();

    let succeeded = open_store(&args).and_then(|store| {
        let engine = Arc::new(LedgerEngine::new(store, args.policy.to_policy()));
        let mut output = std::io::stdout().lock();
        cli::run(&args, &engine, &mut output)
    });

    match succeeded {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn open_store(args: &cli::CliArgs) -> anyhow::Result<Arc<LedgerStore>> {
    let store = match &args.ledger {
        Some(path) => LedgerStore::open(path)
            .with_context(|| format!("Failed to open ledger {}", path.display()))?,
        None => LedgerStore::in_memory(),
    };
    Ok(Arc::new(store))
}
