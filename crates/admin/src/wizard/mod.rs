//! The six-step "client + credit" wizard.
//!
//! - [`state`] - progress held in the session
//! - [`steps`] - forms and local validation
//! - [`flow`] - one submission: gate, validate, call, advance

pub mod flow;
pub mod state;
pub mod steps;

pub use flow::{StepError, StepOutcome, StepSubmission, WizardBackend, submit_step};
pub use state::{ClientSummary, WizardData, WizardError, WizardState};
