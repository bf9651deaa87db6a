//! Core types for Lendix.
//!
//! Type-safe wrappers for the lending domain concepts the console handles.

pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod status;
pub mod step;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use role::Role;
pub use status::CreditStatus;
pub use step::{StepOutOfRange, WizardStep};
