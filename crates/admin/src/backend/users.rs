//! Console users of the principal's company.

use tracing::instrument;

use super::{ApiError, Authorized, NewUser, Page, PageQuery, User, paths};

impl Authorized<'_> {
    /// List users.
    ///
    /// # Errors
    ///
    /// Returns error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: &PageQuery) -> Result<Page<User>, ApiError> {
        self.get_with(paths::USERS, query).await
    }

    /// Create a user with the given roles.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the username is taken.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let created: User = self.post(paths::USERS, user).await?;
        tracing::info!(user_id = %created.id, "User created");
        Ok(created)
    }
}
