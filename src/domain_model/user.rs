use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new_random() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Unordered pair of users, stored smallest id first.
///
/// Rows of a pair are always locked in this order, user rows before edge
/// rows. Both user rows exist, so two transactions on the same pair queue on
/// those record locks before either reaches the edges. That reduces
/// deadlocks; a deadlock the store still reports stays retryable.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn min(&self) -> UserId {
        self.0
    }

    pub fn max(&self) -> UserId {
        self.1
    }

    /// Both directed edges of the pair, in lock order.
    pub fn edges(&self) -> [(UserId, UserId); 2] {
        [(self.0, self.1), (self.1, self.0)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        let a = UserId::new_random();
        let b = UserId::new_random();
        assert_eq!(UserPair::new(a, b), UserPair::new(b, a));

        let pair = UserPair::new(a, b);
        assert!(pair.min() < pair.max());
        assert_eq!(
            pair.edges(),
            [(pair.min(), pair.max()), (pair.max(), pair.min())]
        );
    }

    #[test]
    fn user_id_parses_from_display() {
        let id = UserId::new_random();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }
}
