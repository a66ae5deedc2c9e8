use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert(&self, author: UserId, title: &str, content: &str) -> Result<Post, PostError>;

    async fn get(&self, post_id: PostId) -> Result<Option<Post>, PostError>;

    /// Locks the post row when it exists.
    async fn exists_in_tx(&self, tx: &mut dyn StorageTx, post_id: PostId)
    -> Result<bool, PostError>;

    /// Newest first.
    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, PostError>;

    /// Newest first. An empty author set yields an empty result.
    async fn list_by_authors(&self, authors: &[UserId]) -> Result<Vec<Post>, PostError>;
}
