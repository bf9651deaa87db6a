//! Client CRUD.

use lendix_core::ClientId;
use tracing::instrument;

use super::{ApiError, Authorized, Client, NewClient, Page, PageQuery, paths};

impl Authorized<'_> {
    /// List clients, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_clients(&self, query: &PageQuery) -> Result<Page<Client>, ApiError> {
        self.get_with(paths::CLIENTS, query).await
    }

    /// Get a single client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the client does not exist.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn get_client(&self, id: ClientId) -> Result<Client, ApiError> {
        self.get(&paths::item(paths::CLIENTS, id)).await
    }

    /// Register a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] or [`ApiError::Conflict`] when the
    /// backend rejects the record.
    #[instrument(skip(self, client))]
    pub async fn create_client(&self, client: &NewClient) -> Result<Client, ApiError> {
        let created: Client = self.post(paths::CLIENTS, client).await?;
        tracing::info!(client_id = %created.id, "Client created");
        Ok(created)
    }

    /// Replace a client's profile.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the update.
    #[instrument(skip(self, client), fields(client_id = %id))]
    pub async fn update_client(&self, id: ClientId, client: &NewClient) -> Result<Client, ApiError> {
        self.put(&paths::item(paths::CLIENTS, id), client).await
    }

    /// Delete a client.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the deletion.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn delete_client(&self, id: ClientId) -> Result<(), ApiError> {
        self.delete(&paths::item(paths::CLIENTS, id)).await
    }
}
