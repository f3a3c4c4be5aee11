//! Form-driven entry points for tellers and administrators
//!
//! Each handler parses its form, calls the engine inside a span that carries
//! the operator's username, and folds the result into an [`ActionOutcome`].

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info_span;

use super::forms::{
    AdminFeeForm, CashForm, CustomerForm, MainAccountForm, ProfileForm, ProfitSharingForm,
    TransferForm,
};
use super::outcome::{ActionData, ActionOutcome};
use crate::core::{Execution, LedgerEngine};
use crate::types::{Customer, CustomerId, LedgerError};

/// Authenticated user on whose behalf an action runs
///
/// Only recorded in logs; the ledger itself does not store who acted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub username: String,
}

impl Operator {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

fn respond<T>(
    result: Result<Execution<T>, LedgerError>,
    message: &str,
    data: impl FnOnce(T) -> ActionData,
) -> ActionOutcome {
    match result {
        Ok(Execution::Applied(value)) => ActionOutcome::success(message, data(value)),
        Ok(Execution::AlreadyProcessed) => ActionOutcome::duplicate(),
        Err(error) => error.into(),
    }
}

fn customer_data(customer: &Customer, amount: Option<Decimal>) -> ActionData {
    ActionData {
        amount,
        customer_name: Some(customer.name().to_string()),
        account_number: Some(customer.account_number.clone()),
        balance: Some(customer.balance),
        ..ActionData::default()
    }
}

/// Action layer over a shared engine
#[derive(Debug, Clone)]
pub struct LedgerActions {
    engine: Arc<LedgerEngine>,
}

impl LedgerActions {
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<LedgerEngine> {
        &self.engine
    }

    pub fn register_customer(&self, operator: &Operator, form: &CustomerForm) -> ActionOutcome {
        let _span = info_span!("register_customer", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .register_customer(&input.key, input.profile, input.initial_balance),
            "Nasabah berhasil didaftarkan.",
            |movement| ActionData {
                receipt_number: Some(movement.transaction.receipt_number.clone()),
                ..customer_data(&movement.customer, Some(movement.transaction.amount))
            },
        )
    }

    pub fn update_customer_profile(
        &self,
        operator: &Operator,
        customer_id: &CustomerId,
        form: &ProfileForm,
    ) -> ActionOutcome {
        let _span = info_span!("update_customer_profile", operator = %operator.username).entered();
        let profile = match form.parse() {
            Ok(profile) => profile,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        match self.engine.update_customer_profile(customer_id, profile) {
            Ok(customer) => {
                ActionOutcome::success("Data nasabah berhasil diperbarui.", customer_data(&customer, None))
            }
            Err(error) => error.into(),
        }
    }

    pub fn deposit(&self, operator: &Operator, form: &CashForm) -> ActionOutcome {
        let _span = info_span!("deposit", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .deposit(&input.key, &input.customer_id, input.amount, input.notes),
            "Simpanan berhasil ditambahkan.",
            |movement| ActionData {
                receipt_number: Some(movement.transaction.receipt_number.clone()),
                ..customer_data(&movement.customer, Some(movement.transaction.amount))
            },
        )
    }

    pub fn withdraw(&self, operator: &Operator, form: &CashForm) -> ActionOutcome {
        let _span = info_span!("withdraw", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .withdraw(&input.key, &input.customer_id, input.amount, input.notes),
            "Penarikan berhasil.",
            |movement| ActionData {
                receipt_number: Some(movement.transaction.receipt_number.clone()),
                ..customer_data(&movement.customer, Some(movement.transaction.amount))
            },
        )
    }

    pub fn transfer(&self, operator: &Operator, form: &TransferForm) -> ActionOutcome {
        let _span = info_span!("transfer", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine.transfer(
                &input.key,
                &input.source_customer_id,
                &input.destination_account_number,
                input.amount,
                input.notes,
            ),
            "Transfer berhasil.",
            |receipt| ActionData {
                amount: Some(receipt.debit.amount),
                customer_name: Some(receipt.destination.name().to_string()),
                account_number: Some(receipt.destination.account_number.clone()),
                receipt_number: Some(receipt.debit.receipt_number.clone()),
                balance: Some(receipt.source.balance),
            },
        )
    }

    pub fn deactivate_customer(&self, operator: &Operator, customer_id: &CustomerId) -> ActionOutcome {
        let _span = info_span!("deactivate_customer", operator = %operator.username).entered();
        match self.engine.deactivate_customer(customer_id) {
            Ok(deactivation) => ActionOutcome::success(
                "Nasabah berhasil dinonaktifkan.",
                ActionData {
                    receipt_number: deactivation
                        .written_off
                        .as_ref()
                        .map(|line| line.receipt_number.clone()),
                    ..customer_data(
                        &deactivation.customer,
                        deactivation.written_off.as_ref().map(|line| line.amount),
                    )
                },
            ),
            Err(error) => error.into(),
        }
    }

    pub fn activate_customer(&self, operator: &Operator, customer_id: &CustomerId) -> ActionOutcome {
        let _span = info_span!("activate_customer", operator = %operator.username).entered();
        match self.engine.activate_customer(customer_id) {
            Ok(customer) => ActionOutcome::success("Nasabah berhasil diaktifkan.", customer_data(&customer, None)),
            Err(error) => error.into(),
        }
    }

    pub fn top_up_main(&self, operator: &Operator, form: &MainAccountForm) -> ActionOutcome {
        let _span = info_span!("top_up_main", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .top_up_main(&input.key, input.amount, input.description, input.notes),
            "Top up kas berhasil.",
            |movement| ActionData {
                amount: Some(movement.transaction.amount),
                receipt_number: Some(movement.transaction.receipt_number),
                balance: Some(movement.account.balance),
                ..ActionData::default()
            },
        )
    }

    pub fn withdraw_main(&self, operator: &Operator, form: &MainAccountForm) -> ActionOutcome {
        let _span = info_span!("withdraw_main", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .withdraw_main(&input.key, input.amount, input.description, input.notes),
            "Penarikan kas berhasil.",
            |movement| ActionData {
                amount: Some(movement.transaction.amount),
                receipt_number: Some(movement.transaction.receipt_number),
                balance: Some(movement.account.balance),
                ..ActionData::default()
            },
        )
    }

    pub fn execute_profit_sharing(&self, operator: &Operator, form: &ProfitSharingForm) -> ActionOutcome {
        let _span = info_span!("execute_profit_sharing", operator = %operator.username).entered();
        let (key, total_amount) = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine.execute_profit_sharing(&key, total_amount),
            "Proses bagi hasil berhasil dieksekusi.",
            |event| ActionData {
                amount: Some(event.amount_per_recipient),
                ..ActionData::default()
            },
        )
    }

    pub fn execute_admin_fee(&self, operator: &Operator, form: &AdminFeeForm) -> ActionOutcome {
        let _span = info_span!("execute_admin_fee", operator = %operator.username).entered();
        let input = match form.parse() {
            Ok(input) => input,
            Err(errors) => return ActionOutcome::invalid(errors),
        };

        respond(
            self.engine
                .execute_admin_fee(&input.key, input.amount_per_customer, input.description),
            "Biaya administrasi berhasil dibebankan.",
            |collection| ActionData {
                amount: Some(collection.event.total_amount_collected),
                ..ActionData::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::outcome::{DUPLICATE_MESSAGE, INVALID_MESSAGE};
    use crate::core::IdempotencyKey;

    fn actions() -> LedgerActions {
        LedgerActions::new(Arc::new(LedgerEngine::in_memory()))
    }

    fn teller() -> Operator {
        Operator::new("teller01")
    }

    fn register(actions: &LedgerActions, id_number: &str, initial_balance: &str) -> Customer {
        let form = CustomerForm {
            idempotency_key: IdempotencyKey::generate().to_string(),
            profile: ProfileForm {
                name: "Budi Santoso".to_string(),
                id_number: id_number.to_string(),
                address: "Jl. Sudirman No. 21, Jakarta".to_string(),
                phone: "081298765432".to_string(),
                gender: "MALE".to_string(),
                birth_date: "1988-02-01".to_string(),
            },
            initial_balance: initial_balance.to_string(),
        };
        let account_number = match actions.register_customer(&teller(), &form) {
            ActionOutcome::Success { data: Some(data), .. } => data.account_number.unwrap(),
            other => panic!("registration failed: {:?}", other),
        };
        let summary = actions
            .engine()
            .search_active_customers(&account_number)
            .unwrap()
            .remove(0);
        actions.engine().customer(&summary.id).unwrap()
    }

    #[test]
    fn test_deposit_echoes_name_and_amount() {
        let actions = actions();
        let customer = register(&actions, "3173000000000001", "50000");

        let outcome = actions.deposit(
            &teller(),
            &CashForm {
                idempotency_key: IdempotencyKey::generate().to_string(),
                customer_id: customer.id.to_string(),
                amount: "25000".to_string(),
                notes: Some("setoran mingguan".to_string()),
            },
        );

        match outcome {
            ActionOutcome::Success { message, data } => {
                assert_eq!(message, "Simpanan berhasil ditambahkan.");
                let data = data.unwrap();
                assert_eq!(data.amount, Some(Decimal::new(25_000, 0)));
                assert_eq!(data.customer_name.as_deref(), Some("Budi Santoso"));
                assert_eq!(data.balance, Some(Decimal::new(75_000, 0)));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_repeated_submission_reports_duplicate() {
        let actions = actions();
        let customer = register(&actions, "3173000000000002", "50000");
        let form = CashForm {
            idempotency_key: IdempotencyKey::generate().to_string(),
            customer_id: customer.id.to_string(),
            amount: "10000".to_string(),
            notes: None,
        };

        assert!(actions.withdraw(&teller(), &form).is_success());
        let second = actions.withdraw(&teller(), &form);
        assert_eq!(second.message(), DUPLICATE_MESSAGE);
        assert_eq!(
            actions.engine().customer(&customer.id).unwrap().balance,
            Decimal::new(40_000, 0)
        );
    }

    #[test]
    fn test_invalid_form_never_reaches_engine() {
        let actions = actions();
        let outcome = actions.top_up_main(
            &teller(),
            &MainAccountForm {
                idempotency_key: "abc".to_string(),
                amount: "0".to_string(),
                description: "ok".to_string(),
                notes: None,
            },
        );

        match outcome {
            ActionOutcome::ValidationError { message, errors } => {
                assert_eq!(message, INVALID_MESSAGE);
                assert_eq!(errors.len(), 3);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(actions.engine().main_balance().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_refusal_is_reported_as_error() {
        let actions = actions();
        let customer = register(&actions, "3173000000000003", "50000");

        let outcome = actions.transfer(
            &teller(),
            &TransferForm {
                idempotency_key: IdempotencyKey::generate().to_string(),
                source_customer_id: customer.id.to_string(),
                destination_account_number: customer.account_number.clone(),
                amount: "1000".to_string(),
                notes: None,
            },
        );
        assert_eq!(
            outcome,
            ActionOutcome::Error {
                message: "Tidak bisa transfer ke rekening sendiri.".to_string()
            }
        );
    }
}
