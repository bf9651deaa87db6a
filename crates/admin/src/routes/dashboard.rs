//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::{
    backend::{Credit, CreditQuery, PageQuery, reports::ReportSummary},
    components::ConsoleView,
    error::AppError,
    filters,
    middleware::{RequireAuth, SessionContext},
    state::AppState,
};

use super::console_view;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub view: ConsoleView,
    pub summary: ReportSummary,
    pub recent_credits: Vec<Credit>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET /
#[instrument(skip_all, fields(user_id = %user.principal.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<DashboardTemplate, AppError> {
    let backend = state.backend().authorized(&user.token);
    let recent_query = CreditQuery {
        page: PageQuery {
            page: Some(1),
            page_size: Some(5),
            search: None,
        },
        ..CreditQuery::default()
    };

    let (summary, recent) = tokio::try_join!(
        backend.report_summary(),
        backend.list_credits(&recent_query)
    )?;

    Ok(DashboardTemplate {
        view: console_view(&state, &ctx, &user, "/").await?,
        summary,
        recent_credits: recent.results,
    })
}
