use thiserror::Error;

use crate::db_types::Role;

/// Credential and role management for user accounts.
///
/// The server's `/auth` endpoint builds on this trait: it checks the api key, enforces a strictly increasing nonce
/// (replay protection) and verifies that the requested roles have been granted before issuing an access token.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Verifies the api key for the given user. Returns `UserNotFound` or `InvalidApiKey` on failure.
    async fn check_api_key(&self, user_id: i64, api_key: &str) -> Result<(), AuthApiError>;

    /// Records the nonce for the user iff it is strictly greater than the last one seen.
    async fn upsert_nonce_for_user(&self, user_id: i64, nonce: u64) -> Result<(), AuthApiError>;

    /// Succeeds iff every role in `roles` has been granted to the user.
    async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles. Returns the number of roles actually removed.
    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Nonce is not strictly increasing.")]
    InvalidNonce,
    #[error("User account not found")]
    UserNotFound,
    #[error("Invalid api key")]
    InvalidApiKey,
    #[error("User requested at least {0} roles that are not allowed")]
    RoleNotAllowed(usize),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
