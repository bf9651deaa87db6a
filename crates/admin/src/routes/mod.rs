//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (backend reachable)
//!
//! # Auth
//! GET  /login                       - Login page (last known branding)
//! POST /login                       - Sign in against the backend
//! POST /logout                      - Sign out
//!
//! # Dashboard
//! GET  /                            - Summary counts and recent credits
//!
//! # Clients (officers)
//! GET  /clients                     - Search and list
//! GET  /clients/new                 - New client form
//! POST /clients                     - Create
//! GET  /clients/{id}                - Detail with credits
//! GET  /clients/{id}/edit           - Edit form
//! POST /clients/{id}                - Update
//! POST /clients/{id}/delete         - Delete
//!
//! # Credit types (administrators)
//! GET  /credit-types                - Catalog
//! GET  /credit-types/new            - New product form
//! POST /credit-types                - Create
//! GET  /credit-types/{id}/edit      - Edit form
//! POST /credit-types/{id}           - Update
//! POST /credit-types/{id}/delete    - Delete
//!
//! # Credits (cashiers and up)
//! GET  /credits                     - List, filter by status
//! GET  /credits/{id}                - Detail with payments
//! POST /credits/{id}/status         - Change status (officers)
//! POST /credits/{id}/payments       - Record a payment
//!
//! # Administration (administrators)
//! GET  /users, POST /users          - Users and roles
//! GET  /company, POST /company      - Company branding
//!
//! # Wizard (officers)
//! GET  /wizard                      - Current step
//! POST /wizard/client               - Step 1
//! POST /wizard/documentation        - Step 2 (multipart upload)
//! POST /wizard/employment           - Step 3
//! POST /wizard/address              - Step 4
//! POST /wizard/credit-type          - Step 5
//! POST /wizard/credit               - Step 6
//! POST /wizard/goto/{n}             - Jump to a step
//! POST /wizard/cancel               - Discard progress
//! ```

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::backend::{ApiError, Company};
use crate::components::ConsoleView;
use crate::error::AppError;
use crate::middleware::SessionContext;
use crate::models::SignedIn;
use crate::state::AppState;

pub mod auth;
pub mod clients;
pub mod company;
pub mod credit_types;
pub mod credits;
pub mod dashboard;
pub mod users;
pub mod wizard;

/// Build the console router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(clients::router())
        .merge(credit_types::router())
        .merge(credits::router())
        .merge(users::router())
        .merge(company::router())
        .merge(wizard::router())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Company of the signed-in user, from cache or backend.
///
/// Branding is cosmetic: failures other than an expired token are logged
/// and the page renders without it.
pub(crate) async fn company_for(
    state: &AppState,
    user: &SignedIn,
) -> Result<Option<Company>, AppError> {
    let cache = state.cache();
    let cached = match user.principal.company_id {
        Some(id) => cache.company(id).await,
        None => cache.user_company(user.principal.id).await,
    };
    if cached.is_some() {
        return Ok(cached);
    }

    match state
        .backend()
        .authorized(&user.token)
        .current_company()
        .await
    {
        Ok(company) => {
            if user.principal.company_id.is_some() {
                cache.insert_company(&company).await;
            } else {
                cache.insert_user_company(user.principal.id, &company).await;
            }
            Ok(Some(company))
        }
        Err(ApiError::Unauthorized) => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::debug!(error = %e, "Company branding unavailable");
            Ok(None)
        }
    }
}

/// Layout data for a page, consuming any pending flash notice.
pub(crate) async fn console_view(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    current_path: &str,
) -> Result<ConsoleView, AppError> {
    let company = company_for(state, user).await?;
    Ok(ConsoleView::new(&user.principal, company.as_ref(), current_path)
        .with_flash(ctx.take_flash().await))
}

/// Split a backend failure into a message to show on the form, or an error
/// for the whole page.
pub(crate) fn form_error(err: ApiError) -> Result<String, AppError> {
    match err {
        ApiError::Validation(_)
        | ApiError::Conflict { .. }
        | ApiError::Detail(_)
        | ApiError::Forbidden(_) => Ok(err.display_message()),
        other => Err(other.into()),
    }
}
