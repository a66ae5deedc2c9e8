use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

/// Directed relationship edges keyed by `(owner, target)`.
///
/// A missing row is the `none` status. The `_in_tx` methods take a row lock on
/// backends that support it, so reads followed by writes in the same
/// transaction see a stable pair.
#[async_trait::async_trait]
pub trait FriendshipRepo: Send + Sync {
    /// Locks the user rows of both members, smallest id first. Fails with
    /// `NotFound` if either user does not exist.
    async fn lock_members_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(), RelationError>;

    async fn get_status_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError>;

    /// Fails with `Conflict` if the edge already exists and with `NotFound` if
    /// either user does not.
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError>;

    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError>;

    /// Returns whether a row was removed.
    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<bool, RelationError>;

    async fn get_status(
        &self,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError>;

    async fn list_by_owner(
        &self,
        owner: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError>;

    async fn list_by_target(
        &self,
        target: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError>;
}
