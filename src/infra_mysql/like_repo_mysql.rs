use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

pub struct MySqlLikeRepo {
    pool: MySqlPool,
}

impl MySqlLikeRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LikeRepo for MySqlLikeRepo {
    async fn exists_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<bool, PostError> {
        let tx = downcast(tx).map_err(|e| PostError::Store(e.to_string()))?;

        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM post_like WHERE post_id = ? AND user_id = ? FOR UPDATE",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| PostError::Store(format!("query like: {e}")))?;

        Ok(found.is_some())
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError> {
        let tx = downcast(tx).map_err(|e| PostError::Store(e.to_string()))?;

        let res = sqlx::query("INSERT INTO post_like (post_id, user_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(user_id)
            .execute(tx.conn())
            .await;

        match res {
            Ok(_) => Ok(()),
            // a concurrent like already landed
            Err(e) if is_dup_key(&e) => Ok(()),
            Err(e) => Err(PostError::Store(format!("insert like: {e}"))),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError> {
        let tx = downcast(tx).map_err(|e| PostError::Store(e.to_string()))?;

        sqlx::query("DELETE FROM post_like WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(tx.conn())
            .await
            .map_err(|e| PostError::Store(format!("delete like: {e}")))?;

        Ok(())
    }

    async fn count(&self, post_id: PostId) -> Result<i64, PostError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_like WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostError::Store(format!("count likes: {e}")))
    }

    async fn exists(&self, post_id: PostId, user_id: UserId) -> Result<bool, PostError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM post_like WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PostError::Store(format!("query like: {e}")))?;

        Ok(count > 0)
    }
}
