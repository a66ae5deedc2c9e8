use crate::application_port::*;
use crate::domain_model::{UserId, UserProfile};
use chrono::{Duration, Utc};

const TOKEN_PREFIX: &str = "fake-access-token:";

/// Accepts every login and derives ids from usernames.
///
/// Tokens are `fake-access-token:<username>` and the user id is the UUIDv5
/// of the username. Nothing is stored, so relationship operations on these
/// ids fail with `NotFound` unless a user with that id exists.
#[derive(Debug, Default)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }

    pub fn token_for(username: &str) -> String {
        format!("{TOKEN_PREFIX}{username}")
    }

    pub fn id_for(username: &str) -> UserId {
        UserId(uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            username.as_bytes(),
        ))
    }
}

#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        Ok(Self::id_for(&request.username))
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let now = Utc::now();
        Ok(LoginResult {
            user: UserProfile {
                user_id: Self::id_for(&request.username),
                email: format!("{}@example.invalid", request.username),
                username: request.username.clone(),
                first_name: request.username.clone(),
                last_name: String::new(),
                created_at: now,
            },
            token: AccessToken(Self::token_for(&request.username)),
            expires_at: now + Duration::hours(1),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix(TOKEN_PREFIX) {
            Some(username) if !username.is_empty() => Ok(Self::id_for(username)),
            _ => Err(AuthError::TokenInvalid),
        }
    }

    async fn change_password(
        &self,
        _user_id: UserId,
        _old_password: &str,
        _new_password: &str,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_map_back_to_username_ids() {
        let auth = FakeAuthService::new();
        let login = auth
            .login(LoginInput {
                username: "alice".into(),
                password: "anything".into(),
            })
            .await
            .unwrap();

        assert_eq!(login.user.user_id, FakeAuthService::id_for("alice"));
        assert_ne!(FakeAuthService::id_for("alice"), FakeAuthService::id_for("bob"));
        assert_eq!(
            auth.verify_token(&login.token.0).await.unwrap(),
            login.user.user_id
        );
        assert!(matches!(
            auth.verify_token("fake-access-token:").await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            auth.verify_token("some-jwt").await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
