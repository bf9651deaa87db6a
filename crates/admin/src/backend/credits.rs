//! Credit applications.

use lendix_core::{CreditId, CreditStatus};
use tracing::instrument;

use super::{ApiError, Authorized, Credit, CreditQuery, CreditStatusUpdate, NewCredit, Page, paths};

impl Authorized<'_> {
    /// List credits, optionally filtered by status or client.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_credits(&self, query: &CreditQuery) -> Result<Page<Credit>, ApiError> {
        self.get_with(paths::CREDITS, query).await
    }

    /// Get a single credit.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the credit does not exist.
    #[instrument(skip(self), fields(credit_id = %id))]
    pub async fn get_credit(&self, id: CreditId) -> Result<Credit, ApiError> {
        self.get(&paths::item(paths::CREDITS, id)).await
    }

    /// File a credit application.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the application.
    #[instrument(skip(self, credit), fields(client_id = %credit.client, monto = %credit.monto))]
    pub async fn create_credit(&self, credit: &NewCredit) -> Result<Credit, ApiError> {
        let created: Credit = self.post(paths::CREDITS, credit).await?;
        tracing::info!(credit_id = %created.id, "Credit application filed");
        Ok(created)
    }

    /// Move a credit to another status.
    ///
    /// The backend enforces which transitions are legal.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the transition.
    #[instrument(skip(self), fields(credit_id = %id, estado = %status))]
    pub async fn update_credit_status(
        &self,
        id: CreditId,
        status: CreditStatus,
    ) -> Result<Credit, ApiError> {
        self.patch(
            &paths::item(paths::CREDITS, id),
            &CreditStatusUpdate { estado: status },
        )
        .await
    }
}
