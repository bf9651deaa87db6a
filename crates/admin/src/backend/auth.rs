//! Login and current-user lookup.

use reqwest::Method;
use tracing::instrument;

use super::{
    ApiError, Authorized, BackendClient, LoginRequest, LoginResponse, UserProfile, paths,
};

impl BackendClient {
    /// Exchange credentials for a bearer token and the principal's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or any other
    /// backend failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { username, password };
        let response: LoginResponse =
            Self::send_json(self.request(Method::POST, paths::LOGIN).json(&body)).await?;
        tracing::info!(user_id = %response.user.id, "Backend login succeeded");
        Ok(response)
    }

    /// Check that the backend answers its health endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::GET, paths::HEALTH)).await
    }
}

impl Authorized<'_> {
    /// Fetch the profile bound to the bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] once the token has been revoked.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get(paths::ME).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{client_for, token};
    use super::*;

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .and(body_json(serde_json::json!({"username": "ana", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "abc",
                "user": {"id": 5, "username": "ana", "roles": ["asesor"], "empresa": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let login = client_for(&server).login("ana", "pw").await.unwrap();
        assert_eq!(login.token, "abc");
        assert_eq!(login.user.username, "ana");
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).login("ana", "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5, "username": "ana", "roles": ["superadmin"]
            })))
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let me = backend.authorized(&token).current_user().await.unwrap();
        assert!(me.company_id.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server).ping().await.unwrap();
    }
}
