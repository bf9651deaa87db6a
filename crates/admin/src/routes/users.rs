//! Company users and their roles (administrators).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use lendix_core::{Email, Role};

use crate::{
    backend::{NewUser, PageQuery, User},
    components::{ConsoleView, Pagination},
    error::AppError,
    filters,
    middleware::{Administrators, RequireRole, SessionContext},
    models::SignedIn,
    state::AppState,
    wizard::steps::ValidationError,
};

use super::{console_view, form_error};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Roles an administrator can grant from the console.
static ASSIGNABLE_ROLES: [Role; 3] = [Role::Admin, Role::Advisor, Role::Cashier];

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub view: ConsoleView,
    pub users: Vec<User>,
    pub pagination: Pagination,
    pub assignable: &'static [Role],
    pub form: UserForm,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    page: Option<u32>,
}

/// New user form. Each role is a checkbox.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role_admin: Option<String>,
    #[serde(default)]
    pub role_asesor: Option<String>,
    #[serde(default)]
    pub role_cajero: Option<String>,
}

impl UserForm {
    fn roles(&self) -> Vec<Role> {
        [
            (Role::Admin, &self.role_admin),
            (Role::Advisor, &self.role_asesor),
            (Role::Cashier, &self.role_cajero),
        ]
        .into_iter()
        .filter(|(_, checked)| checked.is_some())
        .map(|(role, _)| role)
        .collect()
    }

    /// Whether the checkbox for `role` should render checked.
    fn has_role(&self, role: &Role) -> bool {
        self.roles().contains(role)
    }

    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError {
                field: "username",
                message: "username is required.".to_string(),
            });
        }
        let email = Email::parse(&self.email).map_err(|e| ValidationError {
            field: "email",
            message: format!("email: {e}."),
        })?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError {
                field: "password",
                message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters."),
            });
        }
        let roles = self.roles();
        if roles.is_empty() {
            return Err(ValidationError {
                field: "roles",
                message: "Select at least one role.".to_string(),
            });
        }

        Ok(NewUser {
            username: username.to_string(),
            email: email.as_str().to_string(),
            password: self.password.clone(),
            roles,
        })
    }

    /// Copy for re-rendering, without the password.
    fn redisplay(mut self) -> Self {
        self.password.clear();
        self
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(index).post(create))
}

async fn render(
    state: &AppState,
    ctx: &SessionContext,
    user: &SignedIn,
    page: u32,
    form: UserForm,
    error: Option<String>,
) -> Result<UsersTemplate, AppError> {
    let users = state
        .backend()
        .authorized(&user.token)
        .list_users(&PageQuery::page(page))
        .await?;
    let pagination = Pagination::new(
        "/users",
        page,
        users.count,
        users.has_previous(),
        users.has_next(),
        &[],
    );

    Ok(UsersTemplate {
        view: console_view(state, ctx, user, "/users").await?,
        users: users.results,
        pagination,
        assignable: &ASSIGNABLE_ROLES,
        form,
        error,
    })
}

/// GET /users
#[instrument(skip(user, state, ctx))]
async fn index(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Query(query): Query<UsersQuery>,
) -> Result<UsersTemplate, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    render(&state, &ctx, &user, page, UserForm::default(), None).await
}

/// POST /users
#[instrument(skip_all)]
async fn create(
    RequireRole(user, ..): RequireRole<Administrators>,
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let new_user = match form.validate() {
        Ok(new_user) => new_user,
        Err(e) => {
            return Ok(render(&state, &ctx, &user, 1, form.redisplay(), Some(e.message))
                .await?
                .into_response());
        }
    };

    match state
        .backend()
        .authorized(&user.token)
        .create_user(&new_user)
        .await
    {
        Ok(created) => {
            tracing::info!(user_id = %created.id, "User created");
            ctx.set_flash(format!("User {} created.", created.username))
                .await?;
            Ok(Redirect::to("/users").into_response())
        }
        Err(e) => {
            let message = form_error(e)?;
            Ok(render(&state, &ctx, &user, 1, form.redisplay(), Some(message))
                .await?
                .into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            username: " caja1 ".to_string(),
            email: "caja1@crediya.test".to_string(),
            password: "s3cretpass".to_string(),
            role_cajero: Some("on".to_string()),
            ..UserForm::default()
        }
    }

    #[test]
    fn test_valid_user() {
        let user = form().validate().unwrap();
        assert_eq!(user.username, "caja1");
        assert_eq!(user.roles, vec![Role::Cashier]);
    }

    #[test]
    fn test_requires_a_role() {
        let f = UserForm {
            role_cajero: None,
            ..form()
        };
        assert_eq!(f.validate().unwrap_err().field, "roles");
    }

    #[test]
    fn test_short_password() {
        let f = UserForm {
            password: "short".to_string(),
            ..form()
        };
        assert_eq!(f.validate().unwrap_err().field, "password");
    }

    #[test]
    fn test_redisplay_drops_password() {
        let f = form().redisplay();
        assert!(f.password.is_empty());
        assert!(f.has_role(&Role::Cashier));
        assert!(!f.has_role(&Role::Admin));
    }
}
