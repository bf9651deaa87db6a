//! The credit application wizard against a mock backend.

#![allow(clippy::unwrap_used)]

use lendix_integration_tests::{TestContext, client_json, location};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn consumer_type() -> Value {
    json!({
        "id": 3,
        "nombre": "Consumo",
        "descripcion": null,
        "monto_minimo": "500.00",
        "monto_maximo": "20000.00",
        "tasa_interes": "12",
        "plazo_minimo": 3,
        "plazo_maximo": 36
    })
}

fn document_upload() -> Form {
    Form::new().text("ci", "4567890").part(
        "archivo",
        Part::bytes(b"%PDF-1.4 scan".to_vec())
            .file_name("ci.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    )
}

async fn register_client(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/api/clientes/"))
        .and(body_partial_json(json!({"nombre": "Ana", "apellido": "Pérez"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(client_json(42)))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .post_form(
            "/wizard/client",
            &[
                ("nombre", "Ana"),
                ("apellido", "Pérez"),
                ("telefono", "+59170000000"),
                ("email", ""),
                ("ci", "4567890"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/wizard");
}

#[tokio::test]
async fn test_step_one_registers_client_and_moves_on() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;

    register_client(&ctx).await;

    let body = ctx.get("/wizard").await.text().await.unwrap();
    assert!(body.contains("Ana Pérez"));
    assert!(body.contains(r#"action="/wizard/documentation""#));
    assert!(body.contains("Client saved."));
}

#[tokio::test]
async fn test_invalid_client_makes_no_backend_call() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;

    Mock::given(method("POST"))
        .and(path("/api/clientes/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(client_json(42)))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .post_form(
            "/wizard/client",
            &[("nombre", ""), ("apellido", "Pérez"), ("telefono", "+59170000000")],
        )
        .await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.unwrap();
    assert!(body.contains("nombre is required."));
    assert!(body.contains(r#"value="Pérez""#));
}

#[tokio::test]
async fn test_documentation_conflict_shows_friendly_message() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;
    register_client(&ctx).await;

    Mock::given(method("POST"))
        .and(path("/api/documentaciones/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "unique",
            "detail": "documentacion with this cliente already exists."
        })))
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .client
        .post(ctx.url("/wizard/documentation"))
        .multipart(document_upload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body = response.text().await.unwrap();
    assert!(body.contains("This client already has documentation registered."));

    // Still on step 2.
    let body = ctx.get("/wizard").await.text().await.unwrap();
    assert!(body.contains(r#"action="/wizard/documentation""#));
}

#[tokio::test]
async fn test_locked_step_cannot_be_visited() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;

    let response = ctx.post_form("/wizard/goto/4", &[]).await;
    assert_eq!(response.status(), 303);

    let body = ctx.get("/wizard").await.text().await.unwrap();
    assert!(body.contains("is locked"));
    assert!(body.contains(r#"action="/wizard/client""#));
}

#[tokio::test]
async fn test_full_application_is_filed() {
    let ctx = TestContext::start().await;
    ctx.sign_in("ana", &["asesor"]).await;
    register_client(&ctx).await;

    Mock::given(method("POST"))
        .and(path("/api/documentaciones/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1, "cliente": 42, "ci": "4567890", "archivo": "/media/ci.pdf"
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/trabajos/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1, "cliente": 42, "empresa": "Tienda Sol", "cargo": "Vendedora", "salario": "3500.00"
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/direcciones/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1, "cliente": 42, "descripcion": "Av. Busch 123", "es_propia": true
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tipos-credito/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [consumer_type()], "count": 1, "next": null, "previous": null
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tipos-credito/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(consumer_type()))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/creditos/"))
        .and(body_partial_json(json!({
            "cliente": 42, "tipo_credito": 3, "plazo": 12, "estado": "pendiente"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "cliente": 42, "tipo_credito": 3, "monto": "1000.00", "plazo": 12,
            "tasa_interes": "12", "cuota": "93.33", "total": "1120.00", "estado": "pendiente"
        })))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx
        .client
        .post(ctx.url("/wizard/documentation"))
        .multipart(document_upload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);

    let response = ctx
        .post_form(
            "/wizard/employment",
            &[("empresa", "Tienda Sol"), ("cargo", "Vendedora"), ("salario", "3500")],
        )
        .await;
    assert_eq!(response.status(), 303);

    let response = ctx
        .post_form(
            "/wizard/address",
            &[("descripcion", "Av. Busch 123"), ("es_propia", "on")],
        )
        .await;
    assert_eq!(response.status(), 303);

    let body = ctx.get("/wizard").await.text().await.unwrap();
    assert!(body.contains("Consumo"));

    let response = ctx
        .post_form("/wizard/credit-type", &[("tipo_credito", "3")])
        .await;
    assert_eq!(response.status(), 303);

    let response = ctx
        .post_form("/wizard/credit", &[("monto", "1000"), ("plazo", "12")])
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/credits/9");

    // The wizard starts over.
    let body = ctx.get("/wizard").await.text().await.unwrap();
    assert!(body.contains(r#"action="/wizard/client""#));
    assert!(!body.contains("Ana Pérez"));
}
