//! Session layer and the session context handlers work through.
//!
//! Sessions live in process memory (`MemoryStore`): the console keeps no
//! database, and a restart signs everyone out.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::ConsoleConfig;
use crate::error::clear_sentry_user;
use crate::models::{SessionState, SignedIn, session_keys};
use crate::wizard::WizardState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lendix_session";

const FLASH_KEY: &str = "flash";

/// Create the in-memory session layer.
#[must_use]
pub fn create_session_layer(config: &ConsoleConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::hours(config.session_hours),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Handle on the current user's session.
///
/// Extracted from the request; requires the session layer.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Read the authentication state from the store.
    pub async fn init(&self) -> SessionState {
        hydrate(Some(&self.session)).await
    }

    /// Sign `signed_in` into a fresh session id, discarding any wizard left
    /// over from a previous user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn login(&self, signed_in: &SignedIn) -> Result<(), tower_sessions::session::Error> {
        self.session.cycle_id().await?;
        self.session.remove_value(session_keys::WIZARD).await?;
        self.session.insert(session_keys::AUTH, signed_in).await
    }

    /// Destroy the session: principal, wizard and flash.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn teardown(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.flush().await
    }

    /// The user's wizard, or a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn wizard(&self) -> Result<WizardState, tower_sessions::session::Error> {
        match self.session.get::<WizardState>(session_keys::WIZARD).await {
            Ok(state) => Ok(state.unwrap_or_default()),
            // A stored wizard from an incompatible build starts over.
            Err(tower_sessions::session::Error::SerdeJson(e)) => {
                tracing::warn!(error = %e, "Discarding undecodable wizard state");
                Ok(WizardState::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist the wizard. A pristine wizard is removed instead of stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_wizard(&self, state: &WizardState) -> Result<(), tower_sessions::session::Error> {
        if state.is_pristine() {
            self.session.remove_value(session_keys::WIZARD).await?;
            return Ok(());
        }
        self.session.insert(session_keys::WIZARD, state).await
    }

    /// Queue a one-time notice for the next page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_flash(&self, message: impl Into<String>) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(FLASH_KEY, message.into()).await
    }

    /// Take the queued notice, if any.
    pub async fn take_flash(&self) -> Option<String> {
        self.session.remove::<String>(FLASH_KEY).await.ok().flatten()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing"))
    }
}

/// Build the [`SessionState`] for a request's session.
pub(crate) async fn hydrate(session: Option<&Session>) -> SessionState {
    let Some(session) = session else {
        return SessionState::Unknown;
    };
    match session.get::<SignedIn>(session_keys::AUTH).await {
        Ok(Some(signed_in)) => SessionState::Authenticated(Box::new(signed_in)),
        Ok(None) => SessionState::Anonymous,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to hydrate session");
            SessionState::HydrationFailed(e.to_string())
        }
    }
}

/// Response marker: the backend rejected this session's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionRejected;

/// Sign the user out when a handler reports [`SessionRejected`].
///
/// Must be layered inside the session layer.
pub async fn teardown_rejected_sessions(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let response = next.run(request).await;

    if response.extensions().get::<SessionRejected>().is_some() {
        if let Some(session) = session {
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to flush rejected session");
            }
        }
        clear_sentry_user();
        tracing::info!("Backend rejected the session token; signed out");
    }

    response
}
