//! Lending backend REST client.
//!
//! One method per backend operation, grouped by resource:
//!
//! - [`auth`] - login and current-user lookup
//! - [`clients`] - client CRUD
//! - [`satellites`] - documentation, employment and address records
//! - [`credit_types`] - credit product catalog
//! - [`credits`] - credit applications and status changes
//! - [`payments`] - payments recorded against credits
//! - [`users`] - console users
//! - [`companies`] - tenant company and branding
//! - [`reports`] - dashboard summary built from list counts
//!
//! # Authentication
//!
//! [`BackendClient`] is shared by every request. Calls on behalf of a signed-in
//! principal go through [`BackendClient::authorized`], which attaches the
//! principal's bearer token. A 401 is returned as [`ApiError::Unauthorized`];
//! the transport takes no further action on it.
//!
//! # Failure semantics
//!
//! No call is retried. Every failure is decoded into an [`ApiError`].

pub mod auth;
pub mod clients;
pub mod companies;
pub mod credit_types;
pub mod credits;
mod error;
pub mod payments;
pub mod reports;
pub mod satellites;
mod types;
pub mod users;

pub use error::{ApiError, FieldErrors, Messages};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// Backend resource paths, relative to the configured API URL.
pub mod paths {
    pub const LOGIN: &str = "/auth/login/";
    pub const ME: &str = "/auth/me/";
    pub const CLIENTS: &str = "/clientes/";
    pub const DOCUMENTATION: &str = "/documentaciones/";
    pub const EMPLOYMENT: &str = "/trabajos/";
    pub const ADDRESSES: &str = "/direcciones/";
    pub const CREDIT_TYPES: &str = "/tipos-credito/";
    pub const CREDITS: &str = "/creditos/";
    pub const PAYMENTS: &str = "/pagos/";
    pub const USERS: &str = "/usuarios/";
    pub const CURRENT_COMPANY: &str = "/empresas/actual/";
    pub const HEALTH: &str = "/health/";

    /// Path of a single record within a collection.
    #[must_use]
    pub fn item(collection: &str, id: impl std::fmt::Display) -> String {
        format!("{collection}{id}/")
    }
}

// =============================================================================
// BearerToken
// =============================================================================

/// Backend bearer token of a signed-in principal.
///
/// Serializes as a plain string so it can live in the server-side session,
/// but never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    fn header_value(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl Serialize for BearerToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl<'de> Deserialize<'de> for BearerToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Lending backend client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lendix-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// The backend base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Act on behalf of a signed-in principal.
    #[must_use]
    pub const fn authorized<'a>(&'a self, token: &'a BearerToken) -> Authorized<'a> {
        Authorized {
            backend: self,
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner.client.request(method, url)
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|e| {
                tracing::warn!(error = %e, %status, "Backend returned an unexpected body");
                ApiError::Decode(e.to_string())
            });
        }

        Err(Self::decode_error(response).await)
    }

    /// Send a request whose success body is ignored.
    async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::decode_error(response).await)
    }

    async fn decode_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status, &body);

        if status.is_server_error() {
            tracing::error!(
                %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned a server error"
            );
        } else {
            tracing::debug!(%status, error = %error, "Backend rejected request");
        }

        error
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Authorized
// =============================================================================

/// Backend handle bound to one principal's bearer token.
#[derive(Clone, Copy)]
pub struct Authorized<'a> {
    backend: &'a BackendClient,
    token: &'a BearerToken,
}

impl Authorized<'_> {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.backend
            .request(method, path)
            .header(reqwest::header::AUTHORIZATION, self.token.header_value())
    }

    /// GET a JSON resource.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        BackendClient::send_json(self.request(Method::GET, path)).await
    }

    /// GET a JSON resource with query parameters.
    pub(crate) async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        BackendClient::send_json(self.request(Method::GET, path).query(query)).await
    }

    /// POST a JSON body.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        BackendClient::send_json(self.request(Method::POST, path).json(body)).await
    }

    /// POST a multipart form.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        BackendClient::send_json(self.request(Method::POST, path).multipart(form)).await
    }

    /// PUT a JSON body.
    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        BackendClient::send_json(self.request(Method::PUT, path).json(body)).await
    }

    /// PATCH a JSON body.
    pub(crate) async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        BackendClient::send_json(self.request(Method::PATCH, path).json(body)).await
    }

    /// DELETE a resource.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        BackendClient::send_empty(self.request(Method::DELETE, path)).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use url::Url;
    use wiremock::MockServer;

    use super::{BackendClient, BearerToken};

    /// A backend client pointed at a mock server.
    pub(crate) fn client_for(server: &MockServer) -> BackendClient {
        let url = Url::parse(&server.uri()).expect("mock server uri");
        BackendClient::new(&url, Duration::from_secs(5)).expect("client builds")
    }

    pub(crate) fn token() -> BearerToken {
        BearerToken::new("test-token")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test_support::{client_for, token};
    use super::*;

    #[test]
    fn test_bearer_token_is_redacted() {
        let token = BearerToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "BearerToken([REDACTED])");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"super-secret\"");
    }

    #[test]
    fn test_item_path() {
        assert_eq!(paths::item(paths::CLIENTS, 42), "/clientes/42/");
    }

    #[tokio::test]
    async fn test_attaches_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clientes/1/"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1, "nombre": "Ana", "apellido": "Quispe", "telefono": "+59171234567"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let client: Client = backend
            .authorized(&token)
            .get(&paths::item(paths::CLIENTS, 1))
            .await
            .unwrap();
        assert_eq!(client.nombre, "Ana");
    }

    #[tokio::test]
    async fn test_401_surfaces_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let result: Result<Client, _> = backend.authorized(&token).get("/clientes/1/").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_success_with_wrong_shape_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let result: Result<Client, _> = backend.authorized(&token).get("/clientes/1/").await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        let backend = BackendClient::new(&url, Duration::from_millis(500)).unwrap();
        let token = token();
        let result: Result<Client, _> = backend.authorized(&token).get("/clientes/1/").await;
        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
        assert!(err.display_message().contains("Could not reach the server"));
    }
}
