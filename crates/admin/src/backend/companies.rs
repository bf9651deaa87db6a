//! Tenant company and branding.

use tracing::instrument;

use super::{ApiError, Authorized, Company, CompanyBranding, paths};

impl Authorized<'_> {
    /// The principal's company.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn current_company(&self) -> Result<Company, ApiError> {
        self.get(paths::CURRENT_COMPANY).await
    }

    /// Update the company's name, logo and primary color.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the branding.
    #[instrument(skip(self, branding), fields(name = %branding.nombre))]
    pub async fn update_company(&self, branding: &CompanyBranding) -> Result<Company, ApiError> {
        self.patch(paths::CURRENT_COMPANY, branding).await
    }
}
