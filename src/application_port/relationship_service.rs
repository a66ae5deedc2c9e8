use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("a relationship already exists between these users")]
    Conflict,
    #[error("no matching relationship or user")]
    NotFound,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RelationError {
    /// Only store failures may be retried by the caller; every other kind
    /// describes a decision that a retry would repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelationError::StoreUnavailable(_))
    }
}

/// Friend-relationship state machine and its read side.
///
/// Identities passed in are trusted to be authenticated and to exist; the
/// store enforces referential integrity.
#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// Creates a single `requester -> recipient = pending` edge.
    async fn send_request(&self, requester: UserId, recipient: UserId)
    -> Result<(), RelationError>;

    /// Resolves a request. Invoked on behalf of `recipient`. Returns the
    /// status both directions of the pair end up in.
    async fn respond(
        &self,
        requester: UserId,
        recipient: UserId,
        action: FriendAction,
    ) -> Result<RelationStatus, RelationError>;

    async fn status_of(&self, owner: UserId, target: UserId)
    -> Result<RelationStatus, RelationError>;

    async fn incoming_pending(&self, user_id: UserId) -> Result<Vec<FriendEdge>, RelationError>;

    async fn confirmed_friends(&self, user_id: UserId)
    -> Result<Vec<FriendEdge>, RelationError>;

    /// Posts authored by confirmed friends, newest first.
    async fn friends_posts(&self, user_id: UserId) -> Result<Vec<Post>, RelationError>;
}
