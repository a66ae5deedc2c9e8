use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(
        &self,
        post_id: PostId,
        author: UserId,
        content: &str,
    ) -> Result<Comment, PostError>;

    async fn get(&self, comment_id: CommentId) -> Result<Option<Comment>, PostError>;

    /// Oldest first.
    async fn list_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, PostError>;

    async fn delete(&self, comment_id: CommentId) -> Result<bool, PostError>;
}
