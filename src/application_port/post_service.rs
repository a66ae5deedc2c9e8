use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    async fn create_post(
        &self,
        author: UserId,
        title: &str,
        content: &str,
    ) -> Result<PostId, PostError>;
    async fn list_posts(&self, author: UserId) -> Result<Vec<Post>, PostError>;

    async fn add_comment(
        &self,
        author: UserId,
        post_id: PostId,
        content: &str,
    ) -> Result<CommentId, PostError>;
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, PostError>;
    async fn delete_comment(&self, acting: UserId, comment_id: CommentId)
    -> Result<(), PostError>;

    async fn toggle_like(&self, user_id: UserId, post_id: PostId)
    -> Result<LikeToggle, PostError>;
    async fn like_count(&self, post_id: PostId) -> Result<i64, PostError>;
    async fn has_liked(&self, user_id: UserId, post_id: PostId) -> Result<bool, PostError>;
}
