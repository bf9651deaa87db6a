//! Credit applications and their payments.
//!
//! Listing and payments are open to cashiers; status changes are reserved
//! for officers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use lendix_core::{CreditId, CreditStatus, Money, MoneyError};

use crate::{
    backend::{ApiError, Client, Credit, CreditQuery, NewPayment, PageQuery, Payment},
    components::{ConsoleView, Pagination},
    error::AppError,
    filters,
    middleware::{Cashiers, Officers, RequireRole, SessionContext},
    state::AppState,
};

use super::{console_view, form_error};

#[derive(Template, WebTemplate)]
#[template(path = "credits/index.html")]
pub struct CreditsIndexTemplate {
    pub view: ConsoleView,
    pub credits: Vec<Credit>,
    pub statuses: &'static [CreditStatus],
    pub selected: Option<CreditStatus>,
    pub pagination: Pagination,
}

impl CreditsIndexTemplate {
    fn is_selected(&self, status: &CreditStatus) -> bool {
        self.selected == Some(*status)
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "credits/show.html")]
pub struct CreditShowTemplate {
    pub view: ConsoleView,
    pub credit: Credit,
    /// `None` when the client could not be loaded for this principal.
    pub client: Option<Client>,
    pub payments: Vec<Payment>,
    pub paid: Money,
    pub today: NaiveDate,
}

impl CreditShowTemplate {
    fn transitions(&self) -> &'static [CreditStatus] {
        self.credit.estado.next()
    }

    fn balance(&self) -> Money {
        let outstanding = self.credit.total.amount() - self.paid.amount();
        Money::new(outstanding.max(Decimal::ZERO))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreditsQuery {
    #[serde(default)]
    estado: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    estado: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    monto: String,
    #[serde(default)]
    fecha: String,
}

impl PaymentForm {
    /// Validate against the credit being paid.
    ///
    /// A blank date means today.
    fn validate(&self, credit: &Credit, today: NaiveDate) -> Result<NewPayment, String> {
        if !credit.estado.accepts_payments() {
            return Err(format!(
                "Payments cannot be recorded on a {} credit.",
                credit.estado.label().to_lowercase()
            ));
        }

        let monto = Money::parse_positive(&self.monto).map_err(|e| match e {
            MoneyError::Empty => "monto is required.".to_string(),
            other => format!("monto: {other}."),
        })?;

        let fecha = match self.fecha.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| "fecha must be a date (YYYY-MM-DD).".to_string())?,
        };
        if fecha > today {
            return Err("fecha cannot be in the future.".to_string());
        }

        Ok(NewPayment {
            credit: credit.id,
            monto,
            fecha,
        })
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<CreditStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(tag) => tag.parse().map(Some).map_err(AppError::BadRequest),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credits", get(index))
        .route("/credits/{id}", get(show))
        .route("/credits/{id}/status", post(update_status))
        .route("/credits/{id}/payments", post(record_payment))
}

/// GET /credits
#[instrument(skip(user, state, ctx))]
async fn index(
    RequireRole(user, ..): RequireRole<Cashiers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<CreditsQuery>,
) -> Result<CreditsIndexTemplate, AppError> {
    let selected = parse_status_filter(query.estado.as_deref())?;
    let page = query.page.unwrap_or(1).max(1);

    let credits = state
        .backend()
        .authorized(&user.token)
        .list_credits(&CreditQuery {
            page: PageQuery::page(page),
            estado: selected,
            client: None,
        })
        .await?;

    let pagination = Pagination::new(
        "/credits",
        page,
        credits.count,
        credits.has_previous(),
        credits.has_next(),
        &[("estado", selected.map(|s| s.as_str()))],
    );

    Ok(CreditsIndexTemplate {
        view: console_view(&state, &ctx, &user, "/credits").await?,
        credits: credits.results,
        statuses: &CreditStatus::ALL,
        selected,
        pagination,
    })
}

/// GET /credits/{id}
#[instrument(skip(user, state, ctx))]
async fn show(
    RequireRole(user, ..): RequireRole<Cashiers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditId>,
) -> Result<CreditShowTemplate, AppError> {
    let backend = state.backend().authorized(&user.token);
    let (credit, payments) =
        tokio::try_join!(backend.get_credit(id), backend.list_all_payments(id))?;

    // Cashiers may not be allowed to read client records.
    let client = match backend.get_client(credit.client).await {
        Ok(client) => Some(client),
        Err(ApiError::Forbidden(_) | ApiError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let paid = Money::new(payments.iter().map(|p| p.monto.amount()).sum());

    Ok(CreditShowTemplate {
        view: console_view(&state, &ctx, &user, "/credits").await?,
        credit,
        client,
        payments,
        paid,
        today: Utc::now().date_naive(),
    })
}

/// POST /credits/{id}/status
#[instrument(skip(user, state, ctx))]
async fn update_status(
    RequireRole(user, ..): RequireRole<Officers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let target: CreditStatus = form.estado.trim().parse().map_err(AppError::BadRequest)?;
    let backend = state.backend().authorized(&user.token);

    let credit = backend.get_credit(id).await?;
    if !credit.estado.next().contains(&target) {
        ctx.set_flash(format!(
            "A {} credit cannot be marked {}.",
            credit.estado.label().to_lowercase(),
            target.label().to_lowercase()
        ))
        .await?;
        return Ok(Redirect::to(&format!("/credits/{id}")));
    }

    match backend.update_credit_status(id, target).await {
        Ok(updated) => {
            tracing::info!(credit_id = %id, estado = %updated.estado, "Credit status changed");
            ctx.set_flash(format!("Credit marked {}.", updated.estado.label().to_lowercase()))
                .await?;
        }
        Err(e) => {
            let message = form_error(e)?;
            ctx.set_flash(format!("Status not changed: {message}")).await?;
        }
    }
    Ok(Redirect::to(&format!("/credits/{id}")))
}

/// POST /credits/{id}/payments
#[instrument(skip(user, state, ctx, form))]
async fn record_payment(
    RequireRole(user, ..): RequireRole<Cashiers>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<CreditId>,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect, AppError> {
    let backend = state.backend().authorized(&user.token);
    let credit = backend.get_credit(id).await?;

    let message = match form.validate(&credit, Utc::now().date_naive()) {
        Err(message) => message,
        Ok(payment) => match backend.create_payment(&payment).await {
            Ok(created) => format!("Payment of {} recorded.", created.monto),
            Err(e) => format!("Payment not recorded: {}", form_error(e)?),
        },
    };
    ctx.set_flash(message).await?;
    Ok(Redirect::to(&format!("/credits/{id}")))
}
