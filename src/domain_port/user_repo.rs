use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub profile: UserProfile,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `UserExists` when the username is taken.
    async fn create(&self, record: &UserRecord) -> Result<(), AuthError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn get_password_hash_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<String>, AuthError>;

    async fn update_password_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    async fn get_username(&self, user_id: UserId) -> Result<Option<String>, AuthError>;

    async fn get_id_by_username(&self, username: &str) -> Result<Option<UserId>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError>;

    /// Ordered by username.
    async fn search_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AuthError>;
}
