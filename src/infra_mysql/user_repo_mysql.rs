use super::util::{downcast, is_dup_key, like_prefix};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_profile(row: &MySqlRow) -> Result<UserProfile, AuthError> {
        let decode = |e: sqlx::Error| AuthError::Store(format!("decode user: {e}"));

        let user_id: UserId = row.try_get("user_id").map_err(decode)?;
        let email: String = row.try_get("email").map_err(decode)?;
        let username: String = row.try_get("username").map_err(decode)?;
        let first_name: String = row.try_get("first_name").map_err(decode)?;
        let last_name: String = row.try_get("last_name").map_err(decode)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

        Ok(UserProfile {
            user_id,
            email,
            username,
            first_name,
            last_name,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, record: &UserRecord) -> Result<(), AuthError> {
        let profile = &record.profile;

        let res = sqlx::query(
            r#"
INSERT INTO user (user_id, email, username, password_hash, first_name, last_name, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(&record.password_hash)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(AuthError::UserExists),
            Err(e) => Err(AuthError::Store(format!("insert user: {e}"))),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, username, password_hash, first_name, last_name, created_at
FROM user
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("query user: {e}")))?;

        row_opt
            .map(|row| {
                let password_hash: String = row
                    .try_get("password_hash")
                    .map_err(|e| AuthError::Store(format!("decode user: {e}")))?;
                Ok(UserRecord {
                    profile: Self::row_to_profile(&row)?,
                    password_hash,
                })
            })
            .transpose()
    }

    async fn get_password_hash_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<String>, AuthError> {
        let tx = downcast(tx).map_err(|e| AuthError::Store(e.to_string()))?;

        sqlx::query_scalar("SELECT password_hash FROM user WHERE user_id = ? FOR UPDATE")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| AuthError::Store(format!("query password hash: {e}")))
    }

    async fn update_password_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx).map_err(|e| AuthError::Store(e.to_string()))?;

        sqlx::query("UPDATE user SET password_hash = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(tx.conn())
            .await
            .map_err(|e| AuthError::Store(format!("update password hash: {e}")))?;

        Ok(())
    }

    async fn get_username(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        sqlx::query_scalar("SELECT username FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query username: {e}")))
    }

    async fn get_id_by_username(&self, username: &str) -> Result<Option<UserId>, AuthError> {
        sqlx::query_scalar("SELECT user_id FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user_id: {e}")))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM user WHERE username = ?"#)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(1) FROM user WHERE user_id = ?"#)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn search_by_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AuthError> {
        let rows = sqlx::query(
            r#"
SELECT user_id, email, username, first_name, last_name, created_at
FROM user
WHERE username LIKE ?
ORDER BY username ASC
LIMIT ?
"#,
        )
        .bind(like_prefix(prefix))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("search users: {e}")))?;

        rows.iter().map(Self::row_to_profile).collect()
    }
}
