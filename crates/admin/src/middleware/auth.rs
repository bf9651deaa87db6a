//! Route guard.
//!
//! [`evaluate`] decides, from the session state alone, whether a page may
//! render. The extractors [`RequireAuth`] and [`RequireRole`] apply that
//! decision in handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn catalog(RequireRole(user, ..): RequireRole<Administrators>) -> impl IntoResponse {
//!     format!("Hello, {}!", user.principal.username)
//! }
//! ```

use std::marker::PhantomData;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use lendix_core::Role;

use super::session::hydrate;
use crate::models::{SessionState, SignedIn};

/// Where the login page lives.
pub const LOGIN_PATH: &str = "/login";

/// Where users land when a page is not for their role.
pub const FALLBACK_PATH: &str = "/";

/// What a route demands of the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Any signed-in principal.
    Authenticated,
    /// A principal holding at least one of these roles.
    AnyOf(&'a [Role]),
}

/// Outcome of the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// The session has not been read yet.
    Loading,
    RedirectToLogin { from: String },
    RedirectToFallback,
    HydrationFailed(String),
}

/// Decide whether `requested` may be shown.
#[must_use]
pub fn evaluate(state: &SessionState, access: Access<'_>, requested: &str) -> GuardDecision {
    match state {
        SessionState::Unknown => GuardDecision::Loading,
        SessionState::Anonymous => GuardDecision::RedirectToLogin {
            from: requested.to_string(),
        },
        SessionState::HydrationFailed(reason) => GuardDecision::HydrationFailed(reason.clone()),
        SessionState::Authenticated(signed_in) => match access {
            Access::AnyOf(allowed) if !signed_in.principal.has_any_role(allowed) => {
                GuardDecision::RedirectToFallback
            }
            _ => GuardDecision::Allow,
        },
    }
}

/// Login URL that returns to `from` afterwards.
#[must_use]
pub fn login_redirect_target(from: &str) -> String {
    if from.is_empty() || from == FALLBACK_PATH {
        return LOGIN_PATH.to_string();
    }
    format!("{LOGIN_PATH}?from={}", urlencoding::encode(from))
}

/// Whether `target` is safe to redirect to after login: a path on this
/// console, not another origin.
#[must_use]
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.contains("://")
}

// =============================================================================
// Rejections
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "session/loading.html")]
struct LoadingTemplate {
    retry_path: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "session/error.html")]
struct HydrationFailedTemplate {
    retry_path: String,
}

/// Why a guarded request did not reach its handler.
#[derive(Debug)]
pub enum GuardRejection {
    Loading { retry_path: String },
    RedirectToLogin { from: String },
    RedirectToFallback,
    HydrationFailed { retry_path: String },
    /// API requests get status codes instead of redirects.
    Unauthorized,
    Forbidden,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Loading { retry_path } => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(axum::http::header::RETRY_AFTER, "1")],
                LoadingTemplate { retry_path },
            )
                .into_response(),
            Self::RedirectToLogin { from } => {
                Redirect::to(&login_redirect_target(&from)).into_response()
            }
            Self::RedirectToFallback => Redirect::to(FALLBACK_PATH).into_response(),
            Self::HydrationFailed { retry_path } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                HydrationFailedTemplate { retry_path },
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Run the guard for a request.
async fn guard(parts: &Parts, access: Access<'_>) -> Result<SignedIn, GuardRejection> {
    let state = hydrate(parts.extensions.get::<Session>()).await;
    let path = parts.uri.path();
    let is_api = path.starts_with("/api/");

    // Only GET pages can be returned to after login.
    let requested = if parts.method == Method::GET {
        parts
            .uri
            .path_and_query()
            .map_or(path, |pq| pq.as_str())
            .to_string()
    } else {
        FALLBACK_PATH.to_string()
    };

    match evaluate(&state, access, &requested) {
        GuardDecision::Allow => match state {
            SessionState::Authenticated(signed_in) => Ok(*signed_in),
            _ => Err(GuardRejection::Unauthorized),
        },
        GuardDecision::Loading => Err(GuardRejection::Loading {
            retry_path: requested,
        }),
        GuardDecision::RedirectToLogin { .. } if is_api => Err(GuardRejection::Unauthorized),
        GuardDecision::RedirectToLogin { from } => Err(GuardRejection::RedirectToLogin { from }),
        GuardDecision::RedirectToFallback if is_api => Err(GuardRejection::Forbidden),
        GuardDecision::RedirectToFallback => {
            tracing::info!(path, "Role gate redirected to fallback");
            Err(GuardRejection::RedirectToFallback)
        }
        GuardDecision::HydrationFailed(_) => Err(GuardRejection::HydrationFailed {
            retry_path: requested,
        }),
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor that requires a signed-in principal.
pub struct RequireAuth(pub SignedIn);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, Access::Authenticated).await.map(Self)
    }
}

/// Roles allowed through a [`RequireRole`] guard.
pub trait RolePolicy: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// Catalog, users and company branding.
pub struct Administrators;

impl RolePolicy for Administrators {
    const ALLOWED: &'static [Role] = &[Role::SuperAdmin, Role::Admin];
}

/// Credit applications and their status.
pub struct Officers;

impl RolePolicy for Officers {
    const ALLOWED: &'static [Role] = &[Role::SuperAdmin, Role::Admin, Role::Advisor];
}

/// Recording payments.
pub struct Cashiers;

impl RolePolicy for Cashiers {
    const ALLOWED: &'static [Role] = &[Role::SuperAdmin, Role::Admin, Role::Advisor, Role::Cashier];
}

/// Extractor that requires a principal holding one of `P::ALLOWED`.
pub struct RequireRole<P: RolePolicy>(pub SignedIn, pub PhantomData<P>);

impl<P, S> FromRequestParts<S> for RequireRole<P>
where
    P: RolePolicy,
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, Access::AnyOf(P::ALLOWED))
            .await
            .map(|signed_in| Self(signed_in, PhantomData))
    }
}
