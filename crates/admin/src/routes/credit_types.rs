//! Credit product catalog (administrators).
//!
//! Listing goes through the catalog cache; every write invalidates it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use lendix_core::{CreditTypeId, Money, MoneyError};

use crate::{
    backend::{CreditType, NewCreditType, PageQuery},
    components::ConsoleView,
    error::AppError,
    filters,
    middleware::{Administrators, RequireRole, SessionContext},
    models::SignedIn,
    state::AppState,
    wizard::steps::ValidationError,
};

use super::{console_view, form_error};

/// Largest catalog page fetched in one request.
const CATALOG_PAGE_SIZE: u32 = 100;

#[derive(Template, WebTemplate)]
#[template(path = "credit_types/index.html")]
pub struct CreditTypesIndexTemplate {
    pub view: ConsoleView,
    pub credit_types: Vec<CreditType>,
}

#[derive(Template, WebTemplate)]
#[template(path = "credit_types/form.html")]
pub struct CreditTypeFormTemplate {
    pub view: ConsoleView,
    pub credit_type_id: Option<CreditTypeId>,
    pub form: CreditTypeInput,
    pub error: Option<String>,
}

impl CreditTypeFormTemplate {
    fn action(&self) -> String {
        self.credit_type_id.map_or_else(
            || "/credit-types".to_string(),
            |id| format!("/credit-types/{id}"),
        )
    }
}

/// Raw catalog form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditTypeInput {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub monto_minimo: String,
    #[serde(default)]
    pub monto_maximo: String,
    #[serde(default)]
    pub tasa_interes: String,
    #[serde(default)]
    pub plazo_minimo: String,
    #[serde(default)]
    pub plazo_maximo: String,
}

impl From<&CreditType> for CreditTypeInput {
    fn from(ct: &CreditType) -> Self {
        Self {
            nombre: ct.nombre.clone(),
            descripcion: ct.descripcion.clone().unwrap_or_default(),
            monto_minimo: ct.monto_minimo.to_string(),
            monto_maximo: ct.monto_maximo.to_string(),
            tasa_interes: ct.tasa_interes.to_string(),
            plazo_minimo: ct.plazo_minimo.to_string(),
            plazo_maximo: ct.plazo_maximo.to_string(),
        }
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

fn amount(field: &'static str, raw: &str) -> Result<Money, ValidationError> {
    Money::parse_positive(raw).map_err(|e| match e {
        MoneyError::Empty => invalid(field, format!("{field} is required.")),
        other => invalid(field, format!("{field}: {other}.")),
    })
}

fn months(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(field, format!("{field} must be a whole number of months."))),
    }
}

impl CreditTypeInput {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<NewCreditType, ValidationError> {
        let nombre = self.nombre.trim();
        if nombre.is_empty() {
            return Err(invalid("nombre", "nombre is required."));
        }

        let monto_minimo = amount("monto_minimo", &self.monto_minimo)?;
        let monto_maximo = amount("monto_maximo", &self.monto_maximo)?;
        if monto_minimo > monto_maximo {
            return Err(invalid(
                "monto_maximo",
                "monto_maximo must not be below monto_minimo.",
            ));
        }

        let tasa_interes: Decimal = self
            .tasa_interes
            .trim()
            .parse()
            .map_err(|_| invalid("tasa_interes", "tasa_interes must be a number."))?;
        if tasa_interes.is_sign_negative() || tasa_interes > Decimal::ONE_HUNDRED {
            return Err(invalid(
                "tasa_interes",
                "tasa_interes must be between 0 and 100.",
            ));
        }

        let plazo_minimo = months("plazo_minimo", &self.plazo_minimo)?;
        let plazo_maximo = months("plazo_maximo", &self.plazo_maximo)?;
        if plazo_minimo > plazo_maximo {
            return Err(invalid(
                "plazo_maximo",
                "plazo_maximo must not be below plazo_minimo.",
            ));
        }

        let descripcion = self.descripcion.trim();
        Ok(NewCreditType {
            nombre: nombre.to_string(),
            descripcion: (!descripcion.is_empty()).then(|| descripcion.to_string()),
            monto_minimo,
            monto_maximo,
            tasa_interes,
            plazo_minimo,
            plazo_maximo,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credit-types", get(index).post(create))
        .route("/credit-types/new", get(new))
        .route("/credit-types/{id}", post(update))
        .route("/credit-types/{id}/edit", get(edit))
        .route("/credit-types/{id}/delete", post(delete))
}

/// The company's catalog, through the cache.
pub(crate) async fn catalog(
    state: &AppState,
    user: &SignedIn,
) -> Result<Vec<CreditType>, AppError> {
    let company = user.principal.company_id;
    if let Some(types) = state.cache().credit_types(company).await {
        return Ok(types);
    }

    let query = PageQuery {
        page_size: Some(CATALOG_PAGE_SIZE),
        ..PageQuery::default()
    };
    let page = state
        .backend()
        .authorized(&user.token)
        .list_credit_types(&query)
        .await?;
    state
        .cache()
        .insert_credit_types(company, page.results.clone())
        .await;
    Ok(page.results)
}

/// GET /credit-types
#[instrument(skip_all)]
async fn index(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<CreditTypesIndexTemplate, AppError> {
    Ok(CreditTypesIndexTemplate {
        credit_types: catalog(&state, &user).await?,
        view: console_view(&state, &ctx, &user, "/credit-types").await?,
    })
}

/// GET /credit-types/new
async fn new(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<CreditTypeFormTemplate, AppError> {
    Ok(CreditTypeFormTemplate {
        view: console_view(&state, &ctx, &user, "/credit-types").await?,
        credit_type_id: None,
        form: CreditTypeInput::default(),
        error: None,
    })
}

/// POST /credit-types
#[instrument(skip_all)]
async fn create(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<CreditTypeInput>,
) -> Result<Response, AppError> {
    save(&state, &ctx, &user, None, form).await
}

/// GET /credit-types/{id}/edit
#[instrument(skip(user, state, ctx))]
async fn edit(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditTypeId>,
) -> Result<CreditTypeFormTemplate, AppError> {
    let credit_type = state
        .backend()
        .authorized(&user.token)
        .get_credit_type(id)
        .await?;

    Ok(CreditTypeFormTemplate {
        view: console_view(&state, &ctx, &user, "/credit-types").await?,
        credit_type_id: Some(id),
        form: CreditTypeInput::from(&credit_type),
        error: None,
    })
}

/// POST /credit-types/{id}
#[instrument(skip(user, state, ctx, form))]
async fn update(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditTypeId>,
    Form(form): Form<CreditTypeInput>,
) -> Result<Response, AppError> {
    save(&state, &ctx, &user, Some(id), form).await
}

/// POST /credit-types/{id}/delete
#[instrument(skip(user, state, ctx))]
async fn delete(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditTypeId>,
) -> Result<Redirect, AppError> {
    let result = state
        .backend()
        .authorized(&user.token)
        .delete_credit_type(id)
        .await;

    match result {
        Ok(()) => {
            state
                .cache()
                .invalidate_credit_types(user.principal.company_id)
                .await;
            ctx.set_flash("Credit type deleted.").await?;
        }
        Err(e) => {
            let message = form_error(e)?;
            ctx.set_flash(format!("Could not delete the credit type: {message}"))
                .await?;
        }
    }
    Ok(Redirect::to("/credit-types"))
}

async fn save(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    id: Option<CreditTypeId>,
    form: CreditTypeInput,
) -> Result<Response, AppError> {
    let rerender = |error: String, form: CreditTypeInput| async move {
        Ok::<_, AppError>(
            CreditTypeFormTemplate {
                view: console_view(state, ctx, user, "/credit-types").await?,
                credit_type_id: id,
                form,
                error: Some(error),
            }
            .into_response(),
        )
    };

    let credit_type = match form.validate() {
        Ok(credit_type) => credit_type,
        Err(e) => return rerender(e.message, form).await,
    };

    let backend = state.backend().authorized(&user.token);
    let result = match id {
        Some(id) => backend.update_credit_type(id, &credit_type).await,
        None => backend.create_credit_type(&credit_type).await,
    };

    match result {
        Ok(saved) => {
            state
                .cache()
                .invalidate_credit_types(user.principal.company_id)
                .await;
            ctx.set_flash(format!("Credit type {} saved.", saved.nombre))
                .await?;
            Ok(Redirect::to("/credit-types").into_response())
        }
        Err(e) => rerender(form_error(e)?, form).await,
    }
}
