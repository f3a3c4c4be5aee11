//! Presentation boundary
//!
//! Raw text forms come in, an [`ActionOutcome`] goes out. Nothing in this
//! module returns an error value to its caller.

pub mod forms;
pub mod handlers;
pub mod outcome;
pub mod validation;

pub use forms::{
    AdminFeeForm, CashForm, CustomerForm, MainAccountForm, ProfileForm, ProfitSharingForm,
    TransferForm,
};
pub use handlers::{LedgerActions, Operator};
pub use outcome::{ActionData, ActionOutcome};
pub use validation::FormValidator;
