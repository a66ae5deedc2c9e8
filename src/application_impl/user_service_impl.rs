use crate::application_port::{AuthError, UserService};
use crate::domain_model::{UserId, UserProfile};
use crate::domain_port::UserRepo;
use std::sync::Arc;

const SEARCH_LIMIT: u32 = 50;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn resolve_username(&self, username: &str) -> Result<UserId, AuthError> {
        self.user_repo
            .get_id_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_username(&self, user_id: UserId) -> Result<String, AuthError> {
        self.user_repo
            .get_username(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn search_users(&self, prefix: Option<&str>) -> Result<Vec<UserProfile>, AuthError> {
        let prefix = prefix.map(str::trim).unwrap_or_default();
        self.user_repo.search_by_prefix(prefix, SEARCH_LIMIT).await
    }
}
