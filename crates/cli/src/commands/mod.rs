//! Command implementations.
//!
//! Output goes through `tracing` at INFO level.

use std::time::Duration;

use lendix_admin::backend::{ApiError, BackendClient, BearerToken, PageQuery};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No backend URL was given.
    #[error("Missing backend URL: pass --api-url or set LENDIX_API_URL")]
    MissingApiUrl,

    /// The backend call failed.
    #[error("{}", .0.display_message())]
    Backend(#[from] ApiError),
}

/// Build a backend client.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built.
pub fn connect(api_url: &Url, timeout: Duration) -> Result<BackendClient, CommandError> {
    Ok(BackendClient::new(api_url, timeout)?)
}

/// Check that the backend answers its health endpoint.
///
/// # Errors
///
/// Returns error if the backend is unreachable or unhealthy.
pub async fn ping(backend: &BackendClient) -> Result<(), CommandError> {
    backend.ping().await?;
    tracing::info!("{} is reachable", backend.base_url());
    Ok(())
}

/// Sign in and print who the backend thinks we are.
///
/// # Errors
///
/// Returns error if the credentials are rejected.
pub async fn whoami(
    backend: &BackendClient,
    username: &str,
    password: &SecretString,
) -> Result<(), CommandError> {
    let login = backend.login(username, password.expose_secret()).await?;
    // Read the profile back with the new token to confirm it is accepted.
    let token = BearerToken::new(login.token);
    let user = backend.authorized(&token).current_user().await?;
    let roles: Vec<&str> = user.roles.iter().map(|r| r.label()).collect();

    tracing::info!("User:    {} (#{})", user.username, user.id);
    if let Some(email) = &user.email {
        tracing::info!("Email:   {email}");
    }
    tracing::info!("Roles:   {}", roles.join(", "));
    if let Some(company) = &user.company_name {
        tracing::info!("Company: {company}");
    }
    Ok(())
}

/// List the credit catalog visible to `token`.
///
/// # Errors
///
/// Returns error if the token is rejected or the request fails.
pub async fn credit_types(backend: &BackendClient, token: SecretString) -> Result<(), CommandError> {
    let token = BearerToken::new(token.expose_secret());
    let page = backend
        .authorized(&token)
        .list_credit_types(&PageQuery::default())
        .await?;

    if page.results.is_empty() {
        tracing::info!("No credit types configured");
    }
    for ct in &page.results {
        tracing::info!(
            "#{:<4} {:<24} {} - {}  {}%  {}-{} months",
            ct.id,
            ct.nombre,
            ct.monto_minimo,
            ct.monto_maximo,
            ct.tasa_interes,
            ct.plazo_minimo,
            ct.plazo_maximo
        );
    }
    tracing::info!("{} credit type(s)", page.count);
    Ok(())
}
