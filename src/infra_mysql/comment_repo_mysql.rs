use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlCommentRepo {
    pool: MySqlPool,
}

impl MySqlCommentRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_comment(row: MySqlRow) -> Result<Comment, PostError> {
        let decode = |e: sqlx::Error| PostError::Store(format!("decode comment: {e}"));

        Ok(Comment {
            comment_id: row.try_get("comment_id").map_err(decode)?,
            post_id: row.try_get("post_id").map_err(decode)?,
            author: row.try_get("author_id").map_err(decode)?,
            content: row.try_get("content").map_err(decode)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(decode)?,
        })
    }
}

#[async_trait::async_trait]
impl CommentRepo for MySqlCommentRepo {
    async fn insert(
        &self,
        post_id: PostId,
        author: UserId,
        content: &str,
    ) -> Result<Comment, PostError> {
        let created_at = Utc::now().trunc_subsecs(6);

        let res = sqlx::query(
            r#"
INSERT INTO comment (post_id, author_id, content, created_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(post_id)
        .bind(author)
        .bind(content)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Store(format!("insert comment: {e}")))?;

        Ok(Comment {
            comment_id: CommentId(res.last_insert_id() as i64),
            post_id,
            author,
            content: content.to_string(),
            created_at,
        })
    }

    async fn get(&self, comment_id: CommentId) -> Result<Option<Comment>, PostError> {
        let row = sqlx::query(
            r#"
SELECT comment_id, post_id, author_id, content, created_at
FROM comment
WHERE comment_id = ?
"#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PostError::Store(format!("query comment: {e}")))?;

        row.map(Self::row_to_comment).transpose()
    }

    async fn list_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, PostError> {
        let rows = sqlx::query(
            r#"
SELECT comment_id, post_id, author_id, content, created_at
FROM comment
WHERE post_id = ?
ORDER BY created_at ASC, comment_id ASC
"#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PostError::Store(format!("list comments: {e}")))?;

        rows.into_iter().map(Self::row_to_comment).collect()
    }

    async fn delete(&self, comment_id: CommentId) -> Result<bool, PostError> {
        let res = sqlx::query("DELETE FROM comment WHERE comment_id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PostError::Store(format!("delete comment: {e}")))?;

        Ok(res.rows_affected() > 0)
    }
}
