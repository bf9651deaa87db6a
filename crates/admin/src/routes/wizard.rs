//! Credit application wizard pages.
//!
//! The wizard lives in the session. Each POST loads it, runs one step
//! through [`submit_step`], and writes it back only when the step went
//! through. Failed steps re-render the page with the submitted values.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tracing::instrument;

use lendix_core::WizardStep;

use crate::{
    backend::{CreditType, DocumentFile},
    components::ConsoleView,
    error::AppError,
    filters,
    middleware::{Officers, RequireRole, SessionContext},
    models::SignedIn,
    state::AppState,
    wizard::{
        ClientSummary, StepError, StepOutcome, StepSubmission, WizardError, WizardState,
        steps::{
            AddressForm, ClientForm, CreditForm, CreditTypeForm, DOCUMENT_CONTENT_TYPES,
            DocumentationForm, EmploymentForm, MAX_DOCUMENT_BYTES,
        },
        submit_step,
    },
};

use super::{console_view, credit_types::catalog};

/// Request body limit for the upload step: the file plus the other fields.
const UPLOAD_BODY_LIMIT: usize = MAX_DOCUMENT_BYTES + 64 * 1024;

/// One entry of the step indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLink {
    pub number: u8,
    pub title: &'static str,
    pub completed: bool,
    pub current: bool,
    /// Whether the entry can be clicked.
    pub reachable: bool,
}

impl StepLink {
    fn all(wizard: &WizardState) -> Vec<Self> {
        WizardStep::ALL
            .into_iter()
            .map(|step| Self {
                number: step.number(),
                title: step.title(),
                completed: wizard.is_completed(step),
                current: step == wizard.current_step(),
                reachable: step != wizard.current_step() && wizard.can_visit(step),
            })
            .collect()
    }
}

/// Values typed into the step forms, kept for re-rendering after a failure.
/// Uploaded files are never echoed back.
#[derive(Debug, Clone, Default)]
pub struct StepForms {
    pub client: ClientForm,
    pub ci: String,
    pub employment: EmploymentForm,
    pub address: AddressForm,
    pub credit_type: String,
    pub credit: CreditForm,
}

impl StepForms {
    fn remember(submission: &StepSubmission) -> Self {
        let mut forms = Self::default();
        match submission {
            StepSubmission::Client(form) => forms.client = form.clone(),
            StepSubmission::Documentation(form) => forms.ci.clone_from(&form.ci),
            StepSubmission::Employment(form) => forms.employment = form.clone(),
            StepSubmission::Address(form) => forms.address = form.clone(),
            StepSubmission::CreditType(form) => forms.credit_type.clone_from(&form.tipo_credito),
            StepSubmission::Credit(form) => forms.credit = form.clone(),
        }
        forms
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "wizard/index.html")]
pub struct WizardTemplate {
    pub view: ConsoleView,
    pub steps: Vec<StepLink>,
    pub current: WizardStep,
    pub client: Option<ClientSummary>,
    pub credit_type: Option<CreditType>,
    /// Catalog, loaded only on the credit type step.
    pub credit_types: Vec<CreditType>,
    pub accepted_types: String,
    pub forms: StepForms,
    pub error: Option<String>,
}

impl WizardTemplate {
    /// Whether `id` is the product currently chosen on the credit type step.
    fn is_selected(&self, credit_type: &CreditType) -> bool {
        let chosen = self.forms.credit_type.trim();
        if chosen.is_empty() {
            self.credit_type.as_ref().is_some_and(|c| c.id == credit_type.id)
        } else {
            chosen == credit_type.id.to_string()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wizard", get(show))
        .route("/wizard/client", post(client))
        .route(
            "/wizard/documentation",
            post(documentation).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/wizard/employment", post(employment))
        .route("/wizard/address", post(address))
        .route("/wizard/credit-type", post(credit_type))
        .route("/wizard/credit", post(credit))
        .route("/wizard/goto/{n}", post(goto))
        .route("/wizard/cancel", post(cancel))
}

async fn render(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    wizard: &WizardState,
    forms: StepForms,
    error: Option<String>,
) -> Result<WizardTemplate, AppError> {
    let credit_types = if wizard.current_step() == WizardStep::CreditType {
        catalog(state, user).await?
    } else {
        Vec::new()
    };

    Ok(WizardTemplate {
        view: console_view(state, ctx, user, "/wizard").await?,
        steps: StepLink::all(wizard),
        current: wizard.current_step(),
        client: wizard.accumulated().client.clone(),
        credit_type: wizard.accumulated().credit_type.clone(),
        credit_types,
        accepted_types: DOCUMENT_CONTENT_TYPES.join(","),
        forms,
        error,
    })
}

/// GET /wizard
#[instrument(skip_all)]
async fn show(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<WizardTemplate, AppError> {
    let wizard = ctx.wizard().await?;
    render(&state, &ctx, &user, &wizard, StepForms::default(), None).await
}

/// Run one step and answer with a redirect or the re-rendered page.
async fn run(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    submission: StepSubmission,
) -> Result<Response, AppError> {
    let mut wizard = ctx.wizard().await?;
    let forms = StepForms::remember(&submission);
    let step = submission.step();
    let backend = state.backend().authorized(&user.token);

    match submit_step(&mut wizard, &backend, submission).await {
        Ok(StepOutcome::Advanced(next)) => {
            ctx.save_wizard(&wizard).await?;
            if next != step {
                ctx.set_flash(format!("{} saved.", step.title())).await?;
            }
            Ok(Redirect::to("/wizard").into_response())
        }
        Ok(StepOutcome::Finished { credit_id }) => {
            ctx.save_wizard(&wizard).await?;
            ctx.set_flash(format!("Credit application #{credit_id} filed."))
                .await?;
            Ok(Redirect::to(&format!("/credits/{credit_id}")).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(AppError::SessionExpired),
        Err(e) => {
            match &e {
                StepError::Conflict { step, detail, .. } => {
                    tracing::warn!(%step, %detail, "Wizard step conflicts with an existing record");
                }
                StepError::Backend { step, error } => {
                    tracing::warn!(%step, error = %error, "Wizard step rejected by backend");
                }
                _ => tracing::debug!(error = %e, "Wizard step not accepted"),
            }
            let page = render(state, ctx, user, &wizard, forms, Some(e.to_string())).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// POST /wizard/client
async fn client(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<ClientForm>,
) -> Result<Response, AppError> {
    run(&state, &ctx, &user, StepSubmission::Client(form)).await
}

/// POST /wizard/documentation
async fn documentation(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    multipart: Multipart,
) -> Result<Response, AppError> {
    match read_documentation(multipart).await {
        Ok(form) => run(&state, &ctx, &user, StepSubmission::Documentation(form)).await,
        Err(message) => {
            let wizard = ctx.wizard().await?;
            let page = render(&state, &ctx, &user, &wizard, StepForms::default(), Some(message))
                .await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// POST /wizard/employment
async fn employment(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<EmploymentForm>,
) -> Result<Response, AppError> {
    run(&state, &ctx, &user, StepSubmission::Employment(form)).await
}

/// POST /wizard/address
async fn address(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<AddressForm>,
) -> Result<Response, AppError> {
    run(&state, &ctx, &user, StepSubmission::Address(form)).await
}

/// POST /wizard/credit-type
async fn credit_type(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<CreditTypeForm>,
) -> Result<Response, AppError> {
    run(&state, &ctx, &user, StepSubmission::CreditType(form)).await
}

/// POST /wizard/credit
async fn credit(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<CreditForm>,
) -> Result<Response, AppError> {
    run(&state, &ctx, &user, StepSubmission::Credit(form)).await
}

/// POST /wizard/goto/{n}
#[instrument(skip(user, ctx))]
async fn goto(
    RequireRole(user, ..): RequireRole<Officers>,
    ctx: SessionContext,
    Path(n): Path<u8>,
) -> Result<Redirect, AppError> {
    let step = WizardStep::from_number(n).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let mut wizard = ctx.wizard().await?;

    match wizard.set_current_step(step) {
        Ok(()) => ctx.save_wizard(&wizard).await?,
        Err(e @ WizardError::StepLocked { .. }) => {
            tracing::debug!(user = %user.principal.username, error = %e, "Wizard step locked");
            ctx.set_flash(e.to_string()).await?;
        }
    }
    Ok(Redirect::to("/wizard"))
}

/// POST /wizard/cancel
#[instrument(skip_all)]
async fn cancel(
    RequireRole(_user, ..): RequireRole<Officers>,
    ctx: SessionContext,
) -> Result<Redirect, AppError> {
    let mut wizard = ctx.wizard().await?;
    if !wizard.is_pristine() {
        wizard.reset();
        ctx.save_wizard(&wizard).await?;
        ctx.set_flash("Application discarded.").await?;
    }
    Ok(Redirect::to("/wizard"))
}

/// Read the upload form. Errors are messages for the page.
async fn read_documentation(mut multipart: Multipart) -> Result<DocumentationForm, String> {
    let mut form = DocumentationForm::default();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "ci" => form.ci = field.text().await.map_err(upload_error)?,
            "archivo" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(upload_error)?;
                // An empty file input still sends a nameless part.
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.file = Some(DocumentFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

fn upload_error(err: MultipartError) -> String {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "archivo must be at most 5 MB.".to_string()
    } else {
        tracing::debug!(error = %err, "Malformed upload");
        "The upload could not be read. Please try again.".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lendix_core::ClientId;

    use super::*;

    #[test]
    fn test_step_links_follow_navigation_policy() {
        let mut wizard = WizardState::new();
        wizard.set_client_id(ClientId::new(42));
        wizard.advance_from(WizardStep::Client);

        let links = StepLink::all(&wizard);
        assert_eq!(links.len(), 6);
        assert!(links[0].completed && links[0].reachable);
        assert!(links[1].current && !links[1].reachable);
        assert!(!links[2].reachable);
    }

    #[test]
    fn test_forms_remembered_without_file() {
        let submission = StepSubmission::Documentation(DocumentationForm {
            ci: "4567890".to_string(),
            file: Some(DocumentFile {
                file_name: "ci.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            }),
        });
        let forms = StepForms::remember(&submission);
        assert_eq!(forms.ci, "4567890");
        assert!(forms.client.nombre.is_empty());

        let forms = StepForms::remember(&StepSubmission::Credit(CreditForm {
            monto: "1500".to_string(),
            plazo: "12".to_string(),
        }));
        assert_eq!(forms.credit.monto, "1500");
    }
}
