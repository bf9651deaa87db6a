//! Client management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use lendix_core::ClientId;

use crate::{
    backend::{Client, Credit, CreditQuery, PageQuery},
    components::{ConsoleView, Pagination},
    error::AppError,
    filters,
    middleware::{Officers, RequireRole, SessionContext},
    state::AppState,
    wizard::steps::ClientForm,
};

use super::{console_view, form_error};

#[derive(Template, WebTemplate)]
#[template(path = "clients/index.html")]
pub struct ClientsIndexTemplate {
    pub view: ConsoleView,
    pub clients: Vec<Client>,
    pub search: String,
    pub pagination: Pagination,
}

#[derive(Template, WebTemplate)]
#[template(path = "clients/show.html")]
pub struct ClientShowTemplate {
    pub view: ConsoleView,
    pub client: Client,
    pub credits: Vec<Credit>,
}

#[derive(Template, WebTemplate)]
#[template(path = "clients/form.html")]
pub struct ClientFormTemplate {
    pub view: ConsoleView,
    /// `None` when creating.
    pub client_id: Option<ClientId>,
    pub form: ClientForm,
    pub error: Option<String>,
}

impl ClientFormTemplate {
    fn action(&self) -> String {
        self.client_id
            .map_or_else(|| "/clients".to_string(), |id| format!("/clients/{id}"))
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientsQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(index).post(create))
        .route("/clients/new", get(new))
        .route("/clients/{id}", get(show).post(update))
        .route("/clients/{id}/edit", get(edit))
        .route("/clients/{id}/delete", post(delete))
}

/// GET /clients
#[instrument(skip(user, state, ctx))]
async fn index(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<ClientsQuery>,
) -> Result<ClientsIndexTemplate, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let clients = state
        .backend()
        .authorized(&user.token)
        .list_clients(&PageQuery::page(page).search(query.q.clone()))
        .await?;

    let search = query.q.unwrap_or_default();
    let pagination = Pagination::new(
        "/clients",
        page,
        clients.count,
        clients.has_previous(),
        clients.has_next(),
        &[("q", Some(search.as_str()))],
    );

    Ok(ClientsIndexTemplate {
        view: console_view(&state, &ctx, &user, "/clients").await?,
        clients: clients.results,
        search,
        pagination,
    })
}

/// GET /clients/new
async fn new(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<ClientFormTemplate, AppError> {
    Ok(ClientFormTemplate {
        view: console_view(&state, &ctx, &user, "/clients").await?,
        client_id: None,
        form: ClientForm::default(),
        error: None,
    })
}

/// POST /clients
#[instrument(skip_all)]
async fn create(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<ClientForm>,
) -> Result<Response, AppError> {
    save(&state, &ctx, &user, None, form).await
}

/// GET /clients/{id}
#[instrument(skip(user, state, ctx))]
async fn show(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<ClientId>,
) -> Result<ClientShowTemplate, AppError> {
    let backend = state.backend().authorized(&user.token);
    let credits_query = CreditQuery {
        client: Some(id),
        ..CreditQuery::default()
    };
    let (client, credits) =
        tokio::try_join!(backend.get_client(id), backend.list_credits(&credits_query))?;

    Ok(ClientShowTemplate {
        view: console_view(&state, &ctx, &user, "/clients").await?,
        client,
        credits: credits.results,
    })
}

/// GET /clients/{id}/edit
#[instrument(skip(user, state, ctx))]
async fn edit(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<ClientId>,
) -> Result<ClientFormTemplate, AppError> {
    let client = state
        .backend()
        .authorized(&user.token)
        .get_client(id)
        .await?;

    Ok(ClientFormTemplate {
        view: console_view(&state, &ctx, &user, "/clients").await?,
        client_id: Some(id),
        form: ClientForm {
            nombre: client.nombre,
            apellido: client.apellido,
            telefono: client.telefono,
            email: client.email,
            ci: client.ci,
        },
        error: None,
    })
}

/// POST /clients/{id}
#[instrument(skip(user, state, ctx, form))]
async fn update(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<ClientId>,
    Form(form): Form<ClientForm>,
) -> Result<Response, AppError> {
    save(&state, &ctx, &user, Some(id), form).await
}

/// POST /clients/{id}/delete
#[instrument(skip(user, state, ctx))]
async fn delete(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<ClientId>,
) -> Result<Redirect, AppError> {
    match state
        .backend()
        .authorized(&user.token)
        .delete_client(id)
        .await
    {
        Ok(()) => ctx.set_flash("Client deleted.").await?,
        Err(e) => {
            let message = form_error(e)?;
            ctx.set_flash(format!("Could not delete the client: {message}"))
                .await?;
            return Ok(Redirect::to(&format!("/clients/{id}")));
        }
    }
    Ok(Redirect::to("/clients"))
}

/// Validate, then create or update. Errors re-render the form.
async fn save(
    state: &AppState,
    ctx: &SessionContext,
    user: &crate::models::SignedIn,
    id: Option<ClientId>,
    form: ClientForm,
) -> Result<Response, AppError> {
    let rerender = |error: String, form: ClientForm| async move {
        Ok::<_, AppError>(
            ClientFormTemplate {
                view: console_view(state, ctx, user, "/clients").await?,
                client_id: id,
                form,
                error: Some(error),
            }
            .into_response(),
        )
    };

    let new_client = match form.validate() {
        Ok(new_client) => new_client,
        Err(e) => return rerender(e.message, form).await,
    };

    let backend = state.backend().authorized(&user.token);
    let result = match id {
        Some(id) => backend.update_client(id, &new_client).await,
        None => backend.create_client(&new_client).await,
    };

    match result {
        Ok(client) => {
            ctx.set_flash(format!("Client {} saved.", client.full_name()))
                .await?;
            Ok(Redirect::to(&format!("/clients/{}", client.id)).into_response())
        }
        Err(e) => rerender(form_error(e)?, form).await,
    }
}
