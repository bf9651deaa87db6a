//! Login and logout.
//!
//! The login form posts credentials to the backend; on success the principal
//! and bearer token go into a fresh session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{ApiError, Company};
use crate::components::layout::DEFAULT_BRAND_COLOR;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::SessionContext;
use crate::middleware::auth::{FALLBACK_PATH, LOGIN_PATH, is_local_path};
use crate::models::SignedIn;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub company_name: String,
    pub logo_url: Option<String>,
    pub brand_color: String,
    pub username: String,
    pub from: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl LoginTemplate {
    fn new(branding: Option<Company>, from: Option<String>) -> Self {
        let (company_name, logo_url, brand_color) = branding.map_or_else(
            || ("Lendix".to_string(), None, DEFAULT_BRAND_COLOR.to_string()),
            |c| {
                (
                    c.nombre,
                    c.logo_url,
                    c.color_primario
                        .unwrap_or_else(|| DEFAULT_BRAND_COLOR.to_string()),
                )
            },
        );
        Self {
            company_name,
            logo_url,
            brand_color,
            username: String::new(),
            from: from.filter(|f| is_local_path(f)).unwrap_or_default(),
            error: None,
            notice: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    from: Option<String>,
    expired: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    from: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/logout", post(logout))
}

/// GET /login
#[instrument(skip(state, ctx))]
async fn login_page(
    State(state): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    // Already signed in: nothing to do here.
    if ctx.init().await.signed_in().is_some() {
        return Redirect::to(FALLBACK_PATH).into_response();
    }

    let mut page = LoginTemplate::new(state.cache().login_branding().await, query.from);
    if query.expired.is_some() {
        page.notice = Some("Your session has expired. Please sign in again.".to_string());
    }
    page.into_response()
}

/// POST /login
#[instrument(skip_all, fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut page = LoginTemplate::new(state.cache().login_branding().await, form.from.clone());
    page.username = form.username.trim().to_string();

    if page.username.is_empty() || form.password.is_empty() {
        page.error = Some("Enter your username and password.".to_string());
        return Ok(page.into_response());
    }

    let signed_in = match state.backend().login(&page.username, &form.password).await {
        Ok(login) => SignedIn::from(login),
        Err(ApiError::Unauthorized | ApiError::Validation(_) | ApiError::Detail(_)) => {
            tracing::info!("Login rejected");
            page.error = Some("Invalid username or password.".to_string());
            return Ok(page.into_response());
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            page.error = Some(e.display_message());
            return Ok(page.into_response());
        }
    };

    ctx.login(&signed_in).await?;
    set_sentry_user(&signed_in.principal);
    tracing::info!(user_id = %signed_in.principal.id, "Signed in");

    let target = if page.from.is_empty() {
        FALLBACK_PATH
    } else {
        page.from.as_str()
    };
    Ok(Redirect::to(target).into_response())
}

/// POST /logout
#[instrument(skip_all)]
async fn logout(ctx: SessionContext) -> Result<Redirect, AppError> {
    ctx.teardown().await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH))
}
