use super::util::{downcast, is_dup_key, is_fk_violation};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlFriendshipRepo {
    pool: MySqlPool,
}

impl MySqlFriendshipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn parse_status(raw: &str) -> Result<EdgeStatus, RelationError> {
        raw.parse::<EdgeStatus>()
            .map_err(RelationError::StoreUnavailable)
    }

    fn row_to_edge(row: MySqlRow) -> Result<FriendEdge, RelationError> {
        let decode = |e: sqlx::Error| RelationError::StoreUnavailable(format!("decode edge: {e}"));

        let owner: UserId = row.try_get("owner_id").map_err(decode)?;
        let target: UserId = row.try_get("target_id").map_err(decode)?;
        let status: String = row.try_get("status").map_err(decode)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

        Ok(FriendEdge {
            owner,
            target,
            status: Self::parse_status(&status)?,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MySqlFriendshipRepo {
    async fn lock_members_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(|e| RelationError::StoreUnavailable(e.to_string()))?;

        // primary key order matches UserPair order
        let found: Vec<UserId> = sqlx::query_scalar(
            r#"
SELECT user_id FROM user
WHERE user_id IN (?, ?)
ORDER BY user_id ASC
FOR UPDATE
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .fetch_all(tx.conn())
        .await
        .map_err(|e| RelationError::StoreUnavailable(format!("lock users: {e}")))?;

        if found.len() < 2 {
            return Err(RelationError::NotFound);
        }
        Ok(())
    }

    async fn get_status_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError> {
        let tx = downcast(tx).map_err(|e| RelationError::StoreUnavailable(e.to_string()))?;

        let status: Option<String> = sqlx::query_scalar(
            r#"
SELECT status FROM friend_edge
WHERE owner_id = ? AND target_id = ?
FOR UPDATE
"#,
        )
        .bind(owner)
        .bind(target)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::StoreUnavailable(format!("lock edge: {e}")))?;

        status.as_deref().map(Self::parse_status).transpose()
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(|e| RelationError::StoreUnavailable(e.to_string()))?;

        let res = sqlx::query(
            r#"
INSERT INTO friend_edge (owner_id, target_id, status)
VALUES (?, ?, ?)
"#,
        )
        .bind(owner)
        .bind(target)
        .bind(status.as_str())
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict),
            Err(e) if is_fk_violation(&e) => Err(RelationError::NotFound),
            Err(e) => Err(RelationError::StoreUnavailable(format!("insert edge: {e}"))),
        }
    }

    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(|e| RelationError::StoreUnavailable(e.to_string()))?;

        let res = sqlx::query(
            r#"
INSERT INTO friend_edge (owner_id, target_id, status)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE status = ?
"#,
        )
        .bind(owner)
        .bind(target)
        .bind(status.as_str())
        .bind(status.as_str())
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_fk_violation(&e) => Err(RelationError::NotFound),
            Err(e) => Err(RelationError::StoreUnavailable(format!("upsert edge: {e}"))),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx).map_err(|e| RelationError::StoreUnavailable(e.to_string()))?;

        let res = sqlx::query("DELETE FROM friend_edge WHERE owner_id = ? AND target_id = ?")
            .bind(owner)
            .bind(target)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::StoreUnavailable(format!("delete edge: {e}")))?;

        Ok(res.rows_affected() > 0)
    }

    async fn get_status(
        &self,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM friend_edge WHERE owner_id = ? AND target_id = ?",
        )
        .bind(owner)
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelationError::StoreUnavailable(format!("query edge: {e}")))?;

        status.as_deref().map(Self::parse_status).transpose()
    }

    async fn list_by_owner(
        &self,
        owner: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
SELECT owner_id, target_id, status, created_at
FROM friend_edge
WHERE owner_id = ?
  AND (? IS NULL OR status = ?)
ORDER BY created_at ASC, target_id ASC
"#,
        )
        .bind(owner)
        .bind(status)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelationError::StoreUnavailable(format!("list edges by owner: {e}")))?;

        rows.into_iter().map(Self::row_to_edge).collect()
    }

    async fn list_by_target(
        &self,
        target: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
SELECT owner_id, target_id, status, created_at
FROM friend_edge
WHERE target_id = ?
  AND (? IS NULL OR status = ?)
ORDER BY created_at ASC, owner_id ASC
"#,
        )
        .bind(target)
        .bind(status)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelationError::StoreUnavailable(format!("list edges by target: {e}")))?;

        rows.into_iter().map(Self::row_to_edge).collect()
    }
}
