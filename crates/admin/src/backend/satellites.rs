//! One-to-one satellites of a client: documentation, employment and address.
//!
//! The backend allows at most one of each per client and answers a second
//! create with a conflict.

use reqwest::multipart::{Form, Part};
use tracing::instrument;

use super::{
    Address, ApiError, Authorized, Documentation, Employment, NewAddress, NewDocumentation,
    NewEmployment, paths,
};

impl Authorized<'_> {
    /// Register identity documentation, uploading the scanned file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the client already has documentation.
    #[instrument(skip(self, doc), fields(client_id = %doc.client, file = %doc.file.file_name))]
    pub async fn create_documentation(
        &self,
        doc: &NewDocumentation,
    ) -> Result<Documentation, ApiError> {
        let file = Part::bytes(doc.file.bytes.clone())
            .file_name(doc.file.file_name.clone())
            .mime_str(&doc.file.content_type)?;

        let form = Form::new()
            .text("cliente", doc.client.to_string())
            .text("ci", doc.ci.clone())
            .part("archivo", file);

        self.post_multipart(paths::DOCUMENTATION, form).await
    }

    /// Register the client's employment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the client already has employment.
    #[instrument(skip(self, job), fields(client_id = %job.client))]
    pub async fn create_employment(&self, job: &NewEmployment) -> Result<Employment, ApiError> {
        self.post(paths::EMPLOYMENT, job).await
    }

    /// Register the client's address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the client already has an address.
    #[instrument(skip(self, address), fields(client_id = %address.client))]
    pub async fn create_address(&self, address: &NewAddress) -> Result<Address, ApiError> {
        self.post(paths::ADDRESSES, address).await
    }
}
