use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserProfile};

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn resolve_username(&self, username: &str) -> Result<UserId, AuthError>;
    async fn get_username(&self, user_id: UserId) -> Result<String, AuthError>;
    /// Prefix search on usernames; `None` lists everyone up to the cap.
    async fn search_users(&self, prefix: Option<&str>) -> Result<Vec<UserProfile>, AuthError>;
}
