//! End-to-end harness for the Lendix console.
//!
//! [`TestContext::start`] runs a `wiremock` server standing in for the
//! lending backend and the full console application on an ephemeral port.
//! The returned HTTP client keeps cookies and does not follow redirects, so
//! tests can assert on every hop.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;

use lendix_admin::{app, config::ConsoleConfig, state::AppState};
use reqwest::{Client, Response, redirect};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Console and mock backend for one test.
pub struct TestContext {
    pub backend: MockServer,
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Start the mock backend and the console.
    pub async fn start() -> Self {
        let backend = MockServer::start().await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let vars = HashMap::from([
            ("LENDIX_API_URL".to_string(), format!("{}/api", backend.uri())),
            ("LENDIX_BASE_URL".to_string(), base_url.clone()),
        ]);
        let config = ConsoleConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let state = AppState::new(config).unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            backend,
            client,
            base_url,
        }
    }

    /// Absolute console URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Mock a successful backend login for `username` with `roles`, plus the
    /// company lookup every page makes.
    pub async fn mock_login(&self, username: &str, roles: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "tok-123",
                "user": {
                    "id": 5,
                    "username": username,
                    "email": format!("{username}@crediya.test"),
                    "roles": roles,
                    "empresa": 7,
                    "empresa_nombre": "Crediya"
                }
            })))
            .mount(&self.backend)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/empresas/actual/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(company()))
            .mount(&self.backend)
            .await;
    }

    /// Sign in through the login form.
    pub async fn sign_in(&self, username: &str, roles: &[&str]) {
        self.mock_login(username, roles).await;
        let response = self
            .post_form("/login", &[("username", username), ("password", "secret")])
            .await;
        assert_eq!(response.status(), 303, "login should redirect");
    }
}

/// The tenant company used across tests.
pub fn company() -> Value {
    json!({
        "id": 7,
        "nombre": "Crediya",
        "logo_url": null,
        "color_primario": "#0a7d4f"
    })
}

/// A client record as the backend returns it.
pub fn client_json(id: i64) -> Value {
    json!({
        "id": id,
        "nombre": "Ana",
        "apellido": "Pérez",
        "telefono": "+59170000000",
        "email": null,
        "ci": "4567890"
    })
}

/// `Location` header of a redirect.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
