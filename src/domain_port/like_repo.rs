use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait LikeRepo: Send + Sync {
    async fn exists_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<bool, PostError>;

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError>;

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostError>;

    async fn count(&self, post_id: PostId) -> Result<i64, PostError>;

    async fn exists(&self, post_id: PostId, user_id: UserId) -> Result<bool, PostError>;
}
