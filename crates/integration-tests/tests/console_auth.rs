//! Sign-in, route guards and session expiry, end to end.

#![allow(clippy::unwrap_used)]

use lendix_integration_tests::{TestContext, client_json, location};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_anonymous_request_redirects_to_login_with_from() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/clients?q=ana").await;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login?from=%2Fclients%3Fq%3Dana");
}

#[tokio::test]
async fn test_login_returns_to_requested_page() {
    let ctx = TestContext::start().await;
    ctx.mock_login("ana", &["asesor"]).await;

    let response = ctx
        .post_form(
            "/login",
            &[("username", "ana"), ("password", "secret"), ("from", "/clients")],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/clients");

    Mock::given(method("GET"))
        .and(path("/api/clientes/"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [client_json(42)],
            "count": 1,
            "next": null,
            "previous": null
        })))
        .mount(&ctx.backend)
        .await;

    let page = ctx.get("/clients").await;
    assert_eq!(page.status(), 200);
    let body = page.text().await.unwrap();
    assert!(body.contains("Ana Pérez"));
    assert!(body.contains("Crediya"));
}

#[tokio::test]
async fn test_bad_credentials_rerender_login() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .post_form("/login", &[("username", "ana"), ("password", "nope")])
        .await;

    assert_eq!(response.status(), 200);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Invalid username or password.")
    );
}

#[tokio::test]
async fn test_role_gate_sends_cashier_to_dashboard() {
    let ctx = TestContext::start().await;
    ctx.sign_in("caja", &["cajero"]).await;

    let response = ctx.get("/credit-types").await;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_backend_401_signs_the_user_out() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;

    Mock::given(method("GET"))
        .and(path("/api/clientes/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.backend)
        .await;

    let response = ctx.get("/clients").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login?expired=1");

    let notice = ctx.get("/login?expired=1").await;
    assert!(notice.text().await.unwrap().contains("Your session has expired"));

    // The session is gone: guarded pages send us back to login.
    let response = ctx.get("/clients").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login?from=%2Fclients");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;

    let response = ctx.post_form("/logout", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");

    let response = ctx.get("/wizard").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login?from=%2Fwizard");
}
