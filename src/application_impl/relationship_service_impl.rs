use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealRelationshipService {
    friendship_repo: Arc<dyn FriendshipRepo>,
    post_repo: Arc<dyn PostRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRelationshipService {
    pub fn new(
        friendship_repo: Arc<dyn FriendshipRepo>,
        post_repo: Arc<dyn PostRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            friendship_repo,
            post_repo,
            tx_manager,
        }
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx>, RelationError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::StoreUnavailable(e.to_string()))
    }

    async fn commit(tx: Box<dyn StorageTx>) -> Result<(), RelationError> {
        tx.commit()
            .await
            .map_err(|e| RelationError::StoreUnavailable(e.to_string()))
    }

    /// Locks both members, then both directions of the pair, and returns
    /// `(forward, reverse)` where forward is `a -> b`. Fails with `NotFound`
    /// if either user does not exist.
    async fn lock_pair(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<(Option<EdgeStatus>, Option<EdgeStatus>), RelationError> {
        let pair = UserPair::new(a, b);
        self.friendship_repo.lock_members_in_tx(tx, pair).await?;

        let (mut forward, mut reverse) = (None, None);

        // order matters: min -> max, then max -> min
        for (owner, target) in pair.edges() {
            let status = self
                .friendship_repo
                .get_status_in_tx(tx, owner, target)
                .await?;
            if owner == a {
                forward = status;
            } else {
                reverse = status;
            }
        }

        Ok((forward, reverse))
    }

    async fn clear_pair(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<(), RelationError> {
        for (owner, target) in UserPair::new(a, b).edges() {
            self.friendship_repo.delete_in_tx(tx, owner, target).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn send_request(
        &self,
        requester: UserId,
        recipient: UserId,
    ) -> Result<(), RelationError> {
        if requester == recipient {
            return Err(RelationError::InvalidOperation(
                "cannot send a friend request to yourself".to_string(),
            ));
        }

        let mut tx = self.begin().await?;

        // any edge in either direction, whatever its status, blocks a new request
        let (forward, reverse) = self.lock_pair(tx.as_mut(), requester, recipient).await?;
        if forward.is_some() || reverse.is_some() {
            debug!(%requester, %recipient, ?forward, ?reverse, "friend request rejected");
            return Err(RelationError::Conflict);
        }

        self.friendship_repo
            .insert_in_tx(tx.as_mut(), requester, recipient, EdgeStatus::Pending)
            .await?;

        Self::commit(tx).await?;

        info!(%requester, %recipient, "friend request sent");
        Ok(())
    }

    async fn respond(
        &self,
        requester: UserId,
        recipient: UserId,
        action: FriendAction,
    ) -> Result<RelationStatus, RelationError> {
        if requester == recipient {
            return Err(RelationError::InvalidOperation(format!(
                "cannot {action} yourself"
            )));
        }

        let mut tx = self.begin().await?;
        let (forward, _) = self.lock_pair(tx.as_mut(), requester, recipient).await?;

        let outcome = match action {
            FriendAction::Accept => {
                if forward != Some(EdgeStatus::Pending) {
                    return Err(RelationError::NotFound);
                }

                self.friendship_repo
                    .upsert_in_tx(tx.as_mut(), requester, recipient, EdgeStatus::Friend)
                    .await?;
                self.friendship_repo
                    .upsert_in_tx(tx.as_mut(), recipient, requester, EdgeStatus::Friend)
                    .await?;

                RelationStatus::Friend
            }
            FriendAction::Decline => {
                self.clear_pair(tx.as_mut(), requester, recipient).await?;

                RelationStatus::None
            }
            FriendAction::Block => {
                self.clear_pair(tx.as_mut(), requester, recipient).await?;
                for (owner, target) in UserPair::new(requester, recipient).edges() {
                    self.friendship_repo
                        .insert_in_tx(tx.as_mut(), owner, target, EdgeStatus::Blocked)
                        .await?;
                }

                RelationStatus::Blocked
            }
        };

        Self::commit(tx).await?;

        info!(%requester, %recipient, %action, ?outcome, "friend request resolved");
        Ok(outcome)
    }

    async fn status_of(
        &self,
        owner: UserId,
        target: UserId,
    ) -> Result<RelationStatus, RelationError> {
        let status = self.friendship_repo.get_status(owner, target).await?;
        Ok(RelationStatus::from(status))
    }

    async fn incoming_pending(&self, user_id: UserId) -> Result<Vec<FriendEdge>, RelationError> {
        self.friendship_repo
            .list_by_target(user_id, Some(EdgeStatus::Pending))
            .await
    }

    async fn confirmed_friends(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FriendEdge>, RelationError> {
        self.friendship_repo
            .list_by_owner(user_id, Some(EdgeStatus::Friend))
            .await
    }

    async fn friends_posts(&self, user_id: UserId) -> Result<Vec<Post>, RelationError> {
        let friend_ids: Vec<UserId> = self
            .confirmed_friends(user_id)
            .await?
            .into_iter()
            .map(|edge| edge.target)
            .collect();

        if friend_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.post_repo
            .list_by_authors(&friend_ids)
            .await
            .map_err(|e| RelationError::StoreUnavailable(e.to_string()))
    }
}
