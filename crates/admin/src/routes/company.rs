//! Company branding (administrators).
//!
//! A successful update refreshes the cached company, so the new branding
//! shows on the next page and on the login screen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::{
    backend::{Company, CompanyBranding},
    components::{ConsoleView, layout::DEFAULT_BRAND_COLOR},
    error::AppError,
    filters,
    middleware::{Administrators, RequireRole, SessionContext},
    models::SignedIn,
    state::AppState,
    wizard::steps::ValidationError,
};

use super::{console_view, form_error};

#[derive(Template, WebTemplate)]
#[template(path = "company.html")]
pub struct CompanyTemplate {
    pub view: ConsoleView,
    pub form: BrandingForm,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub color_primario: String,
}

impl From<&Company> for BrandingForm {
    fn from(company: &Company) -> Self {
        Self {
            nombre: company.nombre.clone(),
            logo_url: company.logo_url.clone().unwrap_or_default(),
            color_primario: company
                .color_primario
                .clone()
                .unwrap_or_else(|| DEFAULT_BRAND_COLOR.to_string()),
        }
    }
}

/// `#rrggbb`
fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}

impl BrandingForm {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<CompanyBranding, ValidationError> {
        let nombre = self.nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError {
                field: "nombre",
                message: "nombre is required.".to_string(),
            });
        }

        let logo_url = match self.logo_url.trim() {
            "" => None,
            raw => {
                let parsed = Url::parse(raw).ok().filter(|u| matches!(u.scheme(), "http" | "https"));
                match parsed {
                    Some(url) => Some(url.to_string()),
                    None => {
                        return Err(ValidationError {
                            field: "logo_url",
                            message: "logo_url must be an http(s) URL.".to_string(),
                        });
                    }
                }
            }
        };

        let color_primario = match self.color_primario.trim() {
            "" => None,
            color if is_hex_color(color) => Some(color.to_lowercase()),
            _ => {
                return Err(ValidationError {
                    field: "color_primario",
                    message: "color_primario must look like #1f6feb.".to_string(),
                });
            }
        };

        Ok(CompanyBranding {
            nombre: nombre.to_string(),
            logo_url,
            color_primario,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/company", get(show).post(update))
}

/// GET /company
#[instrument(skip_all)]
async fn show(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<CompanyTemplate, AppError> {
    let company = state
        .backend()
        .authorized(&user.token)
        .current_company()
        .await?;
    state.cache().insert_company(&company).await;

    Ok(CompanyTemplate {
        view: console_view(&state, &ctx, &user, "/company").await?,
        form: BrandingForm::from(&company),
        error: None,
    })
}

/// POST /company
#[instrument(skip_all)]
async fn update(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<BrandingForm>,
) -> Result<Response, AppError> {
    let branding = match form.validate() {
        Ok(branding) => branding,
        Err(e) => return rerender(&state, &ctx, &user, form, e.message).await,
    };

    match state
        .backend()
        .authorized(&user.token)
        .update_company(&branding)
        .await
    {
        Ok(company) => {
            state.cache().insert_company(&company).await;
            ctx.set_flash("Branding updated.").await?;
            Ok(Redirect::to("/company").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            rerender(&state, &ctx, &user, form, message).await
        }
    }
}

async fn rerender(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    form: BrandingForm,
    error: String,
) -> Result<Response, AppError> {
    Ok(CompanyTemplate {
        view: console_view(state, ctx, user, "/company").await?,
        form,
        error: Some(error),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(color: &str, logo: &str) -> BrandingForm {
        BrandingForm {
            nombre: "Crediya".to_string(),
            logo_url: logo.to_string(),
            color_primario: color.to_string(),
        }
    }

    #[test]
    fn test_blank_optionals_are_none() {
        let branding = form("", " ").validate().unwrap();
        assert_eq!(branding.logo_url, None);
        assert_eq!(branding.color_primario, None);
    }

    #[test]
    fn test_color_is_normalized() {
        let branding = form("#1F6FEB", "https://cdn.crediya.test/logo.png")
            .validate()
            .unwrap();
        assert_eq!(branding.color_primario.as_deref(), Some("#1f6feb"));
    }

    #[test]
    fn test_rejects_bad_color_and_logo() {
        assert_eq!(form("blue", "").validate().unwrap_err().field, "color_primario");
        assert_eq!(
            form("", "javascript:alert(1)").validate().unwrap_err().field,
            "logo_url"
        );
    }
}
