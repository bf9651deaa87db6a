//! Unified error handling for the console.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::ApiError;
use crate::middleware::SessionRejected;
use crate::models::Principal;

/// Where an expired session is sent.
const SESSION_EXPIRED_REDIRECT: &str = "/login?expired=1";

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend call failed.
    #[error("Backend error: {0}")]
    Backend(ApiError),

    /// The backend rejected the principal's token.
    #[error("Session expired")]
    SessionExpired,

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from the browser.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::SessionExpired,
            ApiError::NotFound => Self::NotFound("The requested record no longer exists.".to_string()),
            other => Self::Backend(other),
        }
    }
}

impl AppError {
    /// HTTP status for the error page.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(ApiError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Backend(
                ApiError::Validation(_) | ApiError::Conflict { .. } | ApiError::Detail(_),
            )
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::SessionExpired => StatusCode::SEE_OTHER,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown on the error page. Internal details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Backend(err) => err.display_message(),
            Self::SessionExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::NotFound(what) | Self::BadRequest(what) => what.clone(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::SessionExpired) {
            let mut response = Redirect::to(SESSION_EXPIRED_REDIRECT).into_response();
            response.extensions_mut().insert(SessionRejected);
            return response;
        }

        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        (
            status,
            ErrorTemplate {
                status: status.as_u16(),
                message: self.public_message(),
            },
        )
            .into_response()
    }
}

/// Set the Sentry user context from the signed-in principal.
pub fn set_sentry_user(principal: &Principal) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(principal.id.to_string()),
            username: Some(principal.username.clone()),
            email: principal.email.clone(),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("credit 7".to_string());
        assert_eq!(err.to_string(), "Not found: credit 7");
    }

    #[test]
    fn test_unauthorized_becomes_session_expired() {
        assert!(matches!(
            AppError::from(ApiError::Unauthorized),
            AppError::SessionExpired
        ));
        assert!(matches!(
            AppError::from(ApiError::NotFound),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_session_expired_marks_response() {
        let response = AppError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], SESSION_EXPIRED_REDIRECT);
        assert!(response.extensions().get::<SessionRejected>().is_some());
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Backend(ApiError::Forbidden(String::new()))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Backend(ApiError::Unexpected { status: 500 })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
