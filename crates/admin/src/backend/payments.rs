//! Payments recorded against credits.

use lendix_core::CreditId;
use serde::Serialize;
use tracing::instrument;

use super::{ApiError, Authorized, NewPayment, Page, PageQuery, Payment, paths};

/// Page size used when walking every payment of a credit.
const PAYMENTS_PAGE_SIZE: u32 = 100;

#[derive(Serialize)]
struct PaymentQuery<'a> {
    #[serde(flatten)]
    page: &'a PageQuery,
    credito: CreditId,
}

impl Authorized<'_> {
    /// List payments made on a credit.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self, query), fields(credit_id = %credit))]
    pub async fn list_payments(
        &self,
        credit: CreditId,
        query: &PageQuery,
    ) -> Result<Page<Payment>, ApiError> {
        let query = PaymentQuery {
            page: query,
            credito: credit,
        };
        self.get_with(paths::PAYMENTS, &query).await
    }

    /// Every payment made on a credit, following `next` to the last page.
    ///
    /// # Errors
    ///
    /// Returns the first failing page's error.
    #[instrument(skip(self), fields(credit_id = %credit))]
    pub async fn list_all_payments(&self, credit: CreditId) -> Result<Vec<Payment>, ApiError> {
        let mut payments = Vec::new();
        let mut page = 1;
        loop {
            let query = PageQuery {
                page: Some(page),
                page_size: Some(PAYMENTS_PAGE_SIZE),
                search: None,
            };
            let batch = self.list_payments(credit, &query).await?;
            let total = usize::try_from(batch.count).unwrap_or(usize::MAX);
            let more = batch.has_next() && !batch.results.is_empty();
            payments.extend(batch.results);

            // A backend that keeps answering `next` stops once `count` is reached.
            if !more || payments.len() >= total {
                return Ok(payments);
            }
            page += 1;
        }
    }

    /// Record a payment.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the payment (e.g. the credit is
    /// not active).
    #[instrument(skip(self, payment), fields(credit_id = %payment.credit, monto = %payment.monto))]
    pub async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, ApiError> {
        let created: Payment = self.post(paths::PAYMENTS, payment).await?;
        tracing::info!(payment_id = %created.id, "Payment recorded");
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use lendix_core::Money;
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{client_for, token};
    use super::*;

    #[tokio::test]
    async fn test_list_payments_filters_by_credit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pagos/"))
            .and(query_param("credito", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"id": 1, "credito": 7, "monto": "112.00", "fecha": "2026-03-01"}],
                "count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let page = backend
            .authorized(&token)
            .list_payments(CreditId::new(7), &PageQuery::default())
            .await
            .unwrap();
        assert_eq!(page.results[0].monto.to_string(), "112.00");
    }

    fn payments_page(ids: std::ops::RangeInclusive<i64>, count: u64, next: bool) -> ResponseTemplate {
        let results: Vec<_> = ids
            .map(|id| serde_json::json!({"id": id, "credito": 7, "monto": "100.00", "fecha": "2026-03-01"}))
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": results,
            "count": count,
            "next": next.then_some("https://api.lendix.test/pagos/?page=2"),
            "previous": null
        }))
    }

    #[tokio::test]
    async fn test_list_all_payments_follows_next() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pagos/"))
            .and(query_param("credito", "7"))
            .and(query_param("page", "1"))
            .respond_with(payments_page(1..=10, 12, true))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pagos/"))
            .and(query_param("credito", "7"))
            .and(query_param("page", "2"))
            .respond_with(payments_page(11..=12, 12, false))
            .expect(1)
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let payments = backend
            .authorized(&token)
            .list_all_payments(CreditId::new(7))
            .await
            .unwrap();
        assert_eq!(payments.len(), 12);
        assert_eq!(payments[11].id, 12.into());
    }

    #[tokio::test]
    async fn test_list_all_payments_stops_at_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pagos/"))
            .respond_with(payments_page(1..=10, 12, true))
            .expect(2)
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let payments = backend
            .authorized(&token)
            .list_all_payments(CreditId::new(7))
            .await
            .unwrap();
        assert_eq!(payments.len(), 20);
    }

    #[tokio::test]
    async fn test_create_payment_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pagos/"))
            .and(body_json(serde_json::json!({
                "credito": 7, "monto": "112.00", "fecha": "2026-03-01"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 2, "credito": 7, "monto": "112.00", "fecha": "2026-03-01"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        backend
            .authorized(&token)
            .create_payment(&NewPayment {
                credit: CreditId::new(7),
                monto: Money::new(Decimal::new(11_200, 2)),
                fecha: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            })
            .await
            .unwrap();
    }
}
