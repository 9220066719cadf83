use std::fmt::Debug;

use log::*;

use crate::{
    db_types::Role,
    traits::{AuthApiError, AuthManagement},
};

/// `AuthApi` verifies login requests against stored credentials and manages the roles granted to user accounts.
///
/// Authentication uses an api key plus a strictly increasing nonce for replay protection. Token minting itself is a
/// server concern; this API only answers whether the claims a caller presents are legitimate.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Validates a login attempt. The api key must match the user's stored key, the nonce must be strictly greater
    /// than any nonce seen before, and every requested role must have been granted to the account.
    pub async fn authenticate(
        &self,
        user_id: i64,
        api_key: &str,
        nonce: u64,
        roles: &[Role],
    ) -> Result<(), AuthApiError> {
        self.db.check_api_key(user_id, api_key).await?;
        self.db.upsert_nonce_for_user(user_id, nonce).await?;
        self.db.check_user_has_roles(user_id, roles).await?;
        debug!("🔑️ User #{user_id} authenticated with roles {roles:?}");
        Ok(())
    }

    pub async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        self.db.fetch_roles_for_user(user_id).await
    }

    pub async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        info!("🔑️ Assigning roles {roles:?} to user #{user_id}");
        self.db.assign_roles(user_id, roles).await
    }

    pub async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        info!("🔑️ Removing roles {roles:?} from user #{user_id}");
        self.db.remove_roles(user_id, roles).await
    }
}
