//! Credit detail pages, end to end.

#![allow(clippy::unwrap_used)]

use lendix_integration_tests::{TestContext, client_json};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn payments(ids: std::ops::RangeInclusive<i64>, next: Option<&str>) -> Value {
    let results: Vec<Value> = ids
        .map(|id| json!({"id": id, "credito": 9, "monto": "100.00", "fecha": "2026-02-01"}))
        .collect();
    json!({"results": results, "count": 12, "next": next, "previous": null})
}

#[tokio::test]
async fn test_balance_counts_every_payment_page() {
    let ctx = TestContext::start().await;
    ctx.sign_in("caja", &["cajero"]).await;

    Mock::given(method("GET"))
        .and(path("/api/creditos/9/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9,
            "cliente": 42,
            "tipo_credito": 3,
            "monto": "1000.00",
            "plazo": 12,
            "tasa_interes": "20",
            "cuota": "100.00",
            "total": "1200.00",
            "estado": "activo"
        })))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clientes/42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(client_json(42)))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payments(
            1..=10,
            Some("http://backend.test/api/pagos/?page=2"),
        )))
        .expect(1)
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payments(11..=12, None)))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let response = ctx.get("/credits/9").await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(
        body.contains("<strong>Paid:</strong> 1,200.00 · <strong>Outstanding:</strong> 0.00"),
        "unexpected balance in {body}"
    );
}
