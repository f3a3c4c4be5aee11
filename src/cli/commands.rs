//! Command dispatch
//!
//! Mutating commands go through [`LedgerActions`] so they get the same form
//! parsing and outcome mapping as any other front end. Read commands call the
//! engine directly. Everything is written to `output` as JSON, except the
//! `--csv` listings.

use std::io::Write;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::args::{CashArgs, CliArgs, Command, EventKind, KeyArg, MainCashArgs, ProfileArgs};
use crate::actions::{
    ActionOutcome, AdminFeeForm, CashForm, CustomerForm, LedgerActions, MainAccountForm, Operator,
    ProfileForm, ProfitSharingForm, TransferForm,
};
use crate::core::{CustomerFilter, CustomerSummary, DateRange, IdempotencyKey, LedgerEngine};
use crate::io::{write_customers_csv, write_statement_csv};
use crate::types::LedgerError;

fn key_or_new(key: &KeyArg) -> String {
    key.idempotency_key
        .clone()
        .unwrap_or_else(|| IdempotencyKey::generate().to_string())
}

fn profile_form(profile: &ProfileArgs) -> ProfileForm {
    ProfileForm {
        name: profile.name.clone(),
        id_number: profile.id_number.clone(),
        address: profile.address.clone(),
        phone: profile.phone.clone(),
        gender: profile.gender.clone(),
        birth_date: profile.birth_date.clone(),
    }
}

fn cash_form(cash: &CashArgs) -> CashForm {
    CashForm {
        idempotency_key: key_or_new(&cash.key),
        customer_id: cash.customer_id.clone(),
        amount: cash.amount.clone(),
        notes: cash.notes.clone(),
    }
}

fn main_account_form(cash: &MainCashArgs) -> MainAccountForm {
    MainAccountForm {
        idempotency_key: key_or_new(&cash.key),
        amount: cash.amount.clone(),
        description: cash.description.clone(),
        notes: cash.notes.clone(),
    }
}

fn write_json<T: Serialize>(output: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *output, value).context("Failed to write JSON output")?;
    writeln!(output).context("Failed to write JSON output")
}

/// Print a query result, or its failure as an outcome
fn emit<T: Serialize>(output: &mut dyn Write, result: Result<T, LedgerError>) -> Result<bool> {
    match result {
        Ok(value) => write_json(output, &value).map(|_| true),
        Err(error) => write_json(output, &ActionOutcome::from(error)).map(|_| false),
    }
}

fn emit_outcome(output: &mut dyn Write, outcome: ActionOutcome) -> Result<bool> {
    let success = outcome.is_success();
    write_json(output, &outcome)?;
    Ok(success)
}

/// Run one parsed command
///
/// # Returns
///
/// `Ok(true)` if the command succeeded, `Ok(false)` if it was refused (the
/// refusal has already been written to `output`).
///
/// # Errors
///
/// Only output failures; ledger errors are reported through `output`.
pub fn run(args: &CliArgs, engine: &Arc<LedgerEngine>, output: &mut dyn Write) -> Result<bool> {
    let actions = LedgerActions::new(Arc::clone(engine));
    let operator = Operator::new(args.operator.clone());

    match &args.command {
        Command::Register {
            profile,
            initial_balance,
            key,
        } => {
            let form = CustomerForm {
                idempotency_key: key_or_new(key),
                profile: profile_form(profile),
                initial_balance: initial_balance.clone(),
            };
            emit_outcome(output, actions.register_customer(&operator, &form))
        }
        Command::UpdateProfile {
            customer_id,
            profile,
        } => emit_outcome(
            output,
            actions.update_customer_profile(&operator, customer_id, &profile_form(profile)),
        ),
        Command::Deposit(cash) => emit_outcome(output, actions.deposit(&operator, &cash_form(cash))),
        Command::Withdraw(cash) => emit_outcome(output, actions.withdraw(&operator, &cash_form(cash))),
        Command::Transfer {
            source_customer_id,
            destination_account_number,
            amount,
            notes,
            key,
        } => {
            let form = TransferForm {
                idempotency_key: key_or_new(key),
                source_customer_id: source_customer_id.clone(),
                destination_account_number: destination_account_number.clone(),
                amount: amount.clone(),
                notes: notes.clone(),
            };
            emit_outcome(output, actions.transfer(&operator, &form))
        }
        Command::Deactivate { customer_id } => {
            emit_outcome(output, actions.deactivate_customer(&operator, customer_id))
        }
        Command::Activate { customer_id } => {
            emit_outcome(output, actions.activate_customer(&operator, customer_id))
        }
        Command::Search { query } => emit(output, engine.search_active_customers(query)),
        Command::Customers {
            query,
            status,
            page,
            csv,
        } => {
            let filter = CustomerFilter {
                query: query.clone(),
                status: status.map(Into::into),
            };
            let listing = engine.list_customers(&filter, page.request());
            match listing {
                Ok(listing) if *csv => {
                    let summaries: Vec<CustomerSummary> =
                        listing.items.iter().map(CustomerSummary::from).collect();
                    write_customers_csv(&summaries, output).map_err(|e| anyhow!(e))?;
                    Ok(true)
                }
                other => emit(output, other),
            }
        }
        Command::History { customer_id, page } => {
            emit(output, engine.customer_history(customer_id, page.request()))
        }
        Command::MainHistory { page } => emit(output, engine.main_account_history(page.request())),
        Command::TopUp(cash) => {
            emit_outcome(output, actions.top_up_main(&operator, &main_account_form(cash)))
        }
        Command::WithdrawMain(cash) => {
            emit_outcome(output, actions.withdraw_main(&operator, &main_account_form(cash)))
        }
        Command::Balance => emit(output, engine.main_account()),
        Command::ProfitSharePreview { total_amount } => {
            emit(output, engine.preview_profit_sharing(*total_amount))
        }
        Command::ProfitShare { total_amount, key } => {
            let form = ProfitSharingForm {
                idempotency_key: key_or_new(key),
                total_amount: total_amount.clone(),
            };
            emit_outcome(output, actions.execute_profit_sharing(&operator, &form))
        }
        Command::AdminFeePreview {
            amount_per_customer,
        } => emit(output, engine.preview_admin_fee(*amount_per_customer)),
        Command::AdminFee {
            amount_per_customer,
            description,
            key,
        } => {
            let form = AdminFeeForm {
                idempotency_key: key_or_new(key),
                amount_per_customer: amount_per_customer.clone(),
                description: description.clone(),
            };
            emit_outcome(output, actions.execute_admin_fee(&operator, &form))
        }
        Command::Events { kind, page } => match kind {
            EventKind::ProfitSharing => emit(output, engine.profit_sharing_events(page.request())),
            EventKind::AdminFee => emit(output, engine.admin_fee_events(page.request())),
        },
        Command::Event { kind, id } => match kind {
            EventKind::ProfitSharing => emit(output, engine.profit_sharing_detail(id)),
            EventKind::AdminFee => emit(output, engine.admin_fee_detail(id)),
        },
        Command::Statement {
            customer_id,
            from,
            to,
            csv,
        } => {
            let statement =
                DateRange::new(*from, *to).and_then(|range| engine.statement(customer_id, range));
            match statement {
                Ok(statement) if *csv => {
                    write_statement_csv(&statement, output).map_err(|e| anyhow!(e))?;
                    Ok(true)
                }
                other => emit(output, other),
            }
        }
        Command::Snapshot { date } => {
            let date = date.unwrap_or_else(|| engine.clock().now().date_naive());
            emit(output, engine.record_daily_snapshot(date))
        }
        Command::Dashboard { from, to } => emit(
            output,
            DateRange::new(*from, *to).and_then(|range| engine.dashboard_stats(range)),
        ),
    }
}
