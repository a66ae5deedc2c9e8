use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

// argon2 is deliberately slow, keep it off the async workers
#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::InternalError(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

            match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
            }
        })
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.leeway = 0;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        v
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let ttl = TimeDelta::from_std(self.cfg.access_ttl)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + ttl;
        let claims = AccessClaims {
            sub: user.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError> {
        let data = decode::<AccessClaims>(
            &token.0,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &self.validation(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)
    }
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    tx_manager: Arc<dyn TxManager>,
    min_username_len: usize,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            tx_manager,
            min_username_len: 3,
            min_password_len: 6,
        }
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }
        Ok(())
    }

    fn validate_signup(&self, input: &SignupInput) -> Result<(), AuthError> {
        let username_len = input.username.chars().count();
        if username_len < self.min_username_len || username_len > MAX_FIELD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "username must be {} to {MAX_FIELD_LEN} characters",
                self.min_username_len
            )));
        }
        self.validate_password(&input.password)?;
        if !input.email.contains('@') || input.email.chars().count() > MAX_FIELD_LEN {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        for (field, value) in [
            ("first name", &input.first_name),
            ("last name", &input.last_name),
        ] {
            if value.trim().is_empty() || value.chars().count() > MAX_FIELD_LEN {
                return Err(AuthError::InvalidInput(format!(
                    "{field} must be 1 to {MAX_FIELD_LEN} characters"
                )));
            }
        }
        Ok(())
    }
}

const MAX_FIELD_LEN: usize = 255;

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        self.validate_signup(&request)?;

        if self.user_repo.username_exists(&request.username).await? {
            return Err(AuthError::UserExists);
        }

        let password_hash = self
            .credential_hasher
            .hash_password(&request.password)
            .await?;

        let SignupInput {
            email,
            username,
            first_name,
            last_name,
            ..
        } = request;
        let record = UserRecord {
            profile: UserProfile {
                user_id: UserId::new_random(),
                email,
                username,
                first_name,
                last_name,
                created_at: Utc::now(),
            },
            password_hash,
        };

        // the unique key still catches a concurrent signup with the same name
        self.user_repo.create(&record).await?;

        info!(user_id = %record.profile.user_id, username = %record.profile.username, "user registered");
        Ok(record.profile.user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { username, password } = request;

        let rec = self
            .user_repo
            .get_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            debug!(%username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let (token, expires_at) = self
            .token_codec
            .issue_access_token(rec.profile.user_id)
            .await?;

        Ok(LoginResult {
            user: rec.profile,
            token,
            expires_at,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let user_id = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await?;

        if !self.user_repo.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(user_id)
    }

    async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_password(new_password)?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let current_hash = self
            .user_repo
            .get_password_hash_in_tx(tx.as_mut(), user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let ok = self
            .credential_hasher
            .verify_password(old_password, &current_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.credential_hasher.hash_password(new_password).await?;
        self.user_repo
            .update_password_in_tx(tx.as_mut(), user_id, &new_hash)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        info!(%user_id, "password changed");
        Ok(())
    }
}
