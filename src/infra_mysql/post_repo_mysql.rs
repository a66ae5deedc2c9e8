use super::util::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

pub struct MySqlPostRepo {
    pool: MySqlPool,
}

impl MySqlPostRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_post(row: MySqlRow) -> Result<Post, PostError> {
        let decode = |e: sqlx::Error| PostError::Store(format!("decode post: {e}"));

        let post_id: PostId = row.try_get("post_id").map_err(decode)?;
        let author: UserId = row.try_get("author_id").map_err(decode)?;
        let title: String = row.try_get("title").map_err(decode)?;
        let content: String = row.try_get("content").map_err(decode)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

        Ok(Post {
            post_id,
            author,
            title,
            content,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl PostRepo for MySqlPostRepo {
    async fn insert(&self, author: UserId, title: &str, content: &str) -> Result<Post, PostError> {
        // TIMESTAMP(6) keeps microseconds only
        let created_at = Utc::now().trunc_subsecs(6);

        let res = sqlx::query(
            r#"
INSERT INTO post (author_id, title, content, created_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(author)
        .bind(title)
        .bind(content)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Store(format!("insert post: {e}")))?;

        Ok(Post {
            post_id: PostId(res.last_insert_id() as i64),
            author,
            title: title.to_string(),
            content: content.to_string(),
            created_at,
        })
    }

    async fn get(&self, post_id: PostId) -> Result<Option<Post>, PostError> {
        let row = sqlx::query(
            "SELECT post_id, author_id, title, content, created_at FROM post WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PostError::Store(format!("query post: {e}")))?;

        row.map(Self::row_to_post).transpose()
    }

    async fn exists_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<bool, PostError> {
        let tx = downcast(tx).map_err(|e| PostError::Store(e.to_string()))?;

        // a record lock on the post, so like toggles on it queue here instead
        // of taking gap locks on post_like
        let found: Option<PostId> =
            sqlx::query_scalar("SELECT post_id FROM post WHERE post_id = ? FOR UPDATE")
                .bind(post_id)
                .fetch_optional(tx.conn())
                .await
                .map_err(|e| PostError::Store(format!("lock post: {e}")))?;

        Ok(found.is_some())
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, PostError> {
        self.list_by_authors(&[author]).await
    }

    async fn list_by_authors(&self, authors: &[UserId]) -> Result<Vec<Post>, PostError> {
        // `IN ()` is a syntax error in MySQL
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT post_id, author_id, title, content, created_at FROM post WHERE author_id IN (",
        );
        let mut ids = qb.separated(", ");
        for author in authors {
            ids.push_bind(*author);
        }
        ids.push_unseparated(") ORDER BY created_at DESC, post_id DESC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PostError::Store(format!("list posts: {e}")))?;

        rows.into_iter().map(Self::row_to_post).collect()
    }
}
