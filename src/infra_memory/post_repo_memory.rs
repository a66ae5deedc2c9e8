use super::db::{MemoryDb, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::cmp::Reverse;

fn store_err(e: anyhow::Error) -> PostError {
    PostError::Store(e.to_string())
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|p| Reverse((p.created_at, p.post_id)));
}

pub struct MemoryPostRepo {
    db: MemoryDb,
}

impl MemoryPostRepo {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl PostRepo for MemoryPostRepo {
    async fn insert(&self, author: UserId, title: &str, content: &str) -> Result<Post, PostError> {
        let mut tables = self.db.lock().await;

        let post = Post {
            post_id: tables.next_post_id(),
            author,
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.posts.insert(post.post_id, post.clone());

        Ok(post)
    }

    async fn get(&self, post_id: PostId) -> Result<Option<Post>, PostError> {
        Ok(self.db.lock().await.posts.get(&post_id).cloned())
    }

    async fn exists_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
    ) -> Result<bool, PostError> {
        let tx = downcast(tx).map_err(store_err)?;
        Ok(tx.tables().posts.contains_key(&post_id))
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, PostError> {
        self.list_by_authors(&[author]).await
    }

    async fn list_by_authors(&self, authors: &[UserId]) -> Result<Vec<Post>, PostError> {
        let tables = self.db.lock().await;

        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| authors.contains(&p.author))
            .cloned()
            .collect();
        newest_first(&mut posts);

        Ok(posts)
    }
}

pub struct MemoryCommentRepo {
    db: MemoryDb,
}

impl MemoryCommentRepo {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl CommentRepo for MemoryCommentRepo {
    async fn insert(
        &self,
        post_id: PostId,
        author: UserId,
        content: &str,
    ) -> Result<Comment, PostError> {
        let mut tables = self.db.lock().await;

        // mirrors the foreign key on the mysql schema
        if !tables.posts.contains_key(&post_id) {
            return Err(PostError::PostNotFound);
        }

        let comment = Comment {
            comment_id: tables.next_comment_id(),
            post_id,
            author,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.comment_id, comment.clone());

        Ok(comment)
    }

    async fn get(&self, comment_id: CommentId) -> Result<Option<Comment>, PostError> {
        Ok(self.db.lock().await.comments.get(&comment_id).cloned())
    }

    async fn list_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, PostError> {
        let tables = self.db.lock().await;

        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.comment_id));

        Ok(comments)
    }

    async fn delete(&self, comment_id: CommentId) -> Result<bool, PostError> {
        Ok(self
            .db
            .lock()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }
}

pub struct MemoryLikeRepo {
    db: MemoryDb,
}

impl MemoryLikeRepo {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl LikeRepo for MemoryLikeRepo {
    async fn exists_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<bool, PostError> {
        let tx = downcast(tx).map_err(store_err)?;
        Ok(tx.tables().likes.contains(&(post_id, user_id)))
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError> {
        let tx = downcast(tx).map_err(store_err)?;
        tx.tables().likes.insert((post_id, user_id));
        Ok(())
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError> {
        let tx = downcast(tx).map_err(store_err)?;
        tx.tables().likes.remove(&(post_id, user_id));
        Ok(())
    }

    async fn count(&self, post_id: PostId) -> Result<i64, PostError> {
        let tables = self.db.lock().await;
        Ok(tables.likes.iter().filter(|(p, _)| *p == post_id).count() as i64)
    }

    async fn exists(&self, post_id: PostId, user_id: UserId) -> Result<bool, PostError> {
        Ok(self.db.lock().await.likes.contains(&(post_id, user_id)))
    }
}
