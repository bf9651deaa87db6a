//! Credit product catalog.

use lendix_core::CreditTypeId;
use tracing::instrument;

use super::{ApiError, Authorized, CreditType, NewCreditType, Page, PageQuery, paths};

impl Authorized<'_> {
    /// List the company's credit products.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_credit_types(&self, query: &PageQuery) -> Result<Page<CreditType>, ApiError> {
        self.get_with(paths::CREDIT_TYPES, query).await
    }

    /// Get a single credit product, including its amount and term bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(credit_type_id = %id))]
    pub async fn get_credit_type(&self, id: CreditTypeId) -> Result<CreditType, ApiError> {
        self.get(&paths::item(paths::CREDIT_TYPES, id)).await
    }

    /// Add a credit product.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the product.
    #[instrument(skip(self, credit_type), fields(name = %credit_type.nombre))]
    pub async fn create_credit_type(
        &self,
        credit_type: &NewCreditType,
    ) -> Result<CreditType, ApiError> {
        self.post(paths::CREDIT_TYPES, credit_type).await
    }

    /// Replace a credit product.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the update.
    #[instrument(skip(self, credit_type), fields(credit_type_id = %id))]
    pub async fn update_credit_type(
        &self,
        id: CreditTypeId,
        credit_type: &NewCreditType,
    ) -> Result<CreditType, ApiError> {
        self.put(&paths::item(paths::CREDIT_TYPES, id), credit_type)
            .await
    }

    /// Remove a credit product.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses, e.g. when credits reference it.
    #[instrument(skip(self), fields(credit_type_id = %id))]
    pub async fn delete_credit_type(&self, id: CreditTypeId) -> Result<(), ApiError> {
        self.delete(&paths::item(paths::CREDIT_TYPES, id)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lendix_core::Money;
    use rust_decimal::Decimal;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{client_for, token};
    use super::*;

    #[tokio::test]
    async fn test_get_credit_type_bounds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tipos-credito/3/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 3, "nombre": "Consumo",
                "monto_minimo": "500.00", "monto_maximo": "20000.00",
                "tasa_interes": "12.5", "plazo_minimo": 3, "plazo_maximo": 36
            })))
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let ct = backend
            .authorized(&token)
            .get_credit_type(CreditTypeId::new(3))
            .await
            .unwrap();
        assert_eq!(ct.monto_minimo, Money::new(Decimal::new(500, 0)));
        assert_eq!(ct.tasa_interes, Decimal::new(125, 1));
        assert_eq!(ct.plazo_maximo, 36);
    }

    #[tokio::test]
    async fn test_missing_credit_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Not found."
            })))
            .mount(&server)
            .await;

        let backend = client_for(&server);
        let token = token();
        let err = backend
            .authorized(&token)
            .get_credit_type(CreditTypeId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
