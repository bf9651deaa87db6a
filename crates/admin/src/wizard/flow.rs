//! Step submission.
//!
//! [`submit_step`] runs one step against a [`WizardBackend`]: gate on the
//! client, validate locally, make exactly one backend call, then advance.
//! State is only touched when the call succeeds.

use std::future::Future;

use thiserror::Error;

use lendix_core::{ClientId, CreditId, CreditTypeId, WizardStep};

use super::state::{ClientSummary, WizardState};
use super::steps::{
    AddressForm, ClientForm, CreditForm, CreditTypeForm, DocumentationForm, EmploymentForm,
    ValidationError,
};
use crate::backend::{
    Address, ApiError, Authorized, Client, Credit, CreditType, Documentation, Employment,
    NewAddress, NewClient, NewCredit, NewDocumentation, NewEmployment,
};

/// The backend calls the wizard makes, one per step.
pub trait WizardBackend: Sync {
    fn create_client(&self, client: &NewClient)
    -> impl Future<Output = Result<Client, ApiError>> + Send;

    fn create_documentation(
        &self,
        doc: &NewDocumentation,
    ) -> impl Future<Output = Result<Documentation, ApiError>> + Send;

    fn create_employment(
        &self,
        job: &NewEmployment,
    ) -> impl Future<Output = Result<Employment, ApiError>> + Send;

    fn create_address(
        &self,
        address: &NewAddress,
    ) -> impl Future<Output = Result<Address, ApiError>> + Send;

    fn get_credit_type(
        &self,
        id: CreditTypeId,
    ) -> impl Future<Output = Result<CreditType, ApiError>> + Send;

    fn create_credit(&self, credit: &NewCredit)
    -> impl Future<Output = Result<Credit, ApiError>> + Send;
}

impl WizardBackend for Authorized<'_> {
    fn create_client(
        &self,
        client: &NewClient,
    ) -> impl Future<Output = Result<Client, ApiError>> + Send {
        Authorized::create_client(self, client)
    }

    fn create_documentation(
        &self,
        doc: &NewDocumentation,
    ) -> impl Future<Output = Result<Documentation, ApiError>> + Send {
        Authorized::create_documentation(self, doc)
    }

    fn create_employment(
        &self,
        job: &NewEmployment,
    ) -> impl Future<Output = Result<Employment, ApiError>> + Send {
        Authorized::create_employment(self, job)
    }

    fn create_address(
        &self,
        address: &NewAddress,
    ) -> impl Future<Output = Result<Address, ApiError>> + Send {
        Authorized::create_address(self, address)
    }

    fn get_credit_type(
        &self,
        id: CreditTypeId,
    ) -> impl Future<Output = Result<CreditType, ApiError>> + Send {
        Authorized::get_credit_type(self, id)
    }

    fn create_credit(
        &self,
        credit: &NewCredit,
    ) -> impl Future<Output = Result<Credit, ApiError>> + Send {
        Authorized::create_credit(self, credit)
    }
}

/// A filled-in step form.
#[derive(Debug, Clone)]
pub enum StepSubmission {
    Client(ClientForm),
    Documentation(DocumentationForm),
    Employment(EmploymentForm),
    Address(AddressForm),
    CreditType(CreditTypeForm),
    Credit(CreditForm),
}

impl StepSubmission {
    /// The step this form belongs to.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::Client(_) => WizardStep::Client,
            Self::Documentation(_) => WizardStep::Documentation,
            Self::Employment(_) => WizardStep::Employment,
            Self::Address(_) => WizardStep::Address,
            Self::CreditType(_) => WizardStep::CreditType,
            Self::Credit(_) => WizardStep::Credit,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved on to the given step.
    Advanced(WizardStep),
    /// The application was filed and the wizard reset.
    Finished { credit_id: CreditId },
}

/// Why a submission did not go through. The wizard state is unchanged.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Register the client first.")]
    MissingClient { step: WizardStep },

    #[error("{submitted} is not the current step ({current}).")]
    OutOfTurn {
        submitted: WizardStep,
        current: WizardStep,
    },

    #[error("{0} has already been registered for this client.")]
    AlreadyCompleted(WizardStep),

    #[error("Choose a credit type first.")]
    MissingCreditType,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Conflict {
        step: WizardStep,
        message: &'static str,
        detail: String,
    },

    #[error("{}", .error.display_message())]
    Backend { step: WizardStep, error: ApiError },
}

impl StepError {
    /// The backend rejected the principal's token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Backend {
                error: ApiError::Unauthorized,
                ..
            }
        )
    }

    /// Take the backend error out, if this is one.
    #[must_use]
    pub fn into_api_error(self) -> Option<ApiError> {
        match self {
            Self::Backend { error, .. } => Some(error),
            _ => None,
        }
    }

    fn from_api(step: WizardStep, error: ApiError) -> Self {
        match error {
            ApiError::Conflict { detail, .. } => Self::Conflict {
                step,
                message: conflict_message(step),
                detail,
            },
            error => Self::Backend { step, error },
        }
    }
}

/// Friendly text for a uniqueness violation at `step`.
#[must_use]
pub const fn conflict_message(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Client => "A client with this identity is already registered.",
        WizardStep::Documentation => "This client already has documentation registered.",
        WizardStep::Employment => "This client already has employment information registered.",
        WizardStep::Address => "This client already has an address registered.",
        WizardStep::CreditType => "This credit type can no longer be selected.",
        WizardStep::Credit => "This client already has an open application for this credit.",
    }
}

/// Submit one step.
///
/// # Errors
///
/// Returns [`StepError`] without touching `state` if the step is gated,
/// out of turn, invalid, or rejected by the backend.
#[tracing::instrument(skip_all, fields(step = %submission.step(), client_id = tracing::field::Empty))]
pub async fn submit_step<B: WizardBackend>(
    state: &mut WizardState,
    backend: &B,
    submission: StepSubmission,
) -> Result<StepOutcome, StepError> {
    let step = submission.step();
    let client = gate(state, step)?;
    if let Some(client) = client {
        tracing::Span::current().record("client_id", client.get());
    }

    match submission {
        StepSubmission::Client(form) => {
            let new_client = form.validate()?;
            let created = backend
                .create_client(&new_client)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
            state.set_client_id(created.id);
            state.accumulated_mut().client = Some(ClientSummary::from(&created));
        }
        StepSubmission::Documentation(form) => {
            let doc = form.validate(require(client, step)?)?;
            backend
                .create_documentation(&doc)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
        }
        StepSubmission::Employment(form) => {
            let job = form.validate(require(client, step)?)?;
            backend
                .create_employment(&job)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
        }
        StepSubmission::Address(form) => {
            let address = form.validate(require(client, step)?)?;
            backend
                .create_address(&address)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
        }
        StepSubmission::CreditType(form) => {
            let id = form.validate()?;
            let credit_type = backend
                .get_credit_type(id)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
            state.accumulated_mut().credit_type = Some(credit_type);
        }
        StepSubmission::Credit(form) => {
            let credit_type = state
                .accumulated()
                .credit_type
                .as_ref()
                .ok_or(StepError::MissingCreditType)?;
            let credit = form.validate(require(client, step)?, credit_type)?;
            let created = backend
                .create_credit(&credit)
                .await
                .map_err(|e| StepError::from_api(step, e))?;
            state.reset();
            tracing::info!(credit_id = %created.id, "Wizard finished");
            return Ok(StepOutcome::Finished {
                credit_id: created.id,
            });
        }
    }

    let next = state.advance_from(step).unwrap_or(step);
    Ok(StepOutcome::Advanced(next))
}

/// Checks that need no input: client present, right step, not done yet.
fn gate(state: &WizardState, step: WizardStep) -> Result<Option<ClientId>, StepError> {
    let client = state.client_id();
    if step.requires_client() && client.is_none() {
        return Err(StepError::MissingClient { step });
    }
    // The product choice may be revised; every other record is one-shot.
    if state.is_completed(step) && step != WizardStep::CreditType {
        return Err(StepError::AlreadyCompleted(step));
    }
    if step != state.current_step() {
        return Err(StepError::OutOfTurn {
            submitted: step,
            current: state.current_step(),
        });
    }
    Ok(client)
}

fn require(client: Option<ClientId>, step: WizardStep) -> Result<ClientId, StepError> {
    client.ok_or(StepError::MissingClient { step })
}
