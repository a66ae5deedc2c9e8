use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status carried by a stored edge. `none` is never stored: it is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Pending,
    Friend,
    Blocked,
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Friend => "friend",
            EdgeStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EdgeStatus::Pending),
            "friend" => Ok(EdgeStatus::Friend),
            "blocked" => Ok(EdgeStatus::Blocked),
            other => Err(format!("unknown edge status: {other}")),
        }
    }
}

/// Status of one direction of a pair as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStatus {
    None,
    Pending,
    Friend,
    Blocked,
}

impl From<Option<EdgeStatus>> for RelationStatus {
    fn from(status: Option<EdgeStatus>) -> Self {
        match status {
            None => RelationStatus::None,
            Some(EdgeStatus::Pending) => RelationStatus::Pending,
            Some(EdgeStatus::Friend) => RelationStatus::Friend,
            Some(EdgeStatus::Blocked) => RelationStatus::Blocked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendAction {
    Accept,
    Decline,
    Block,
}

impl fmt::Display for FriendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FriendAction::Accept => "accept",
            FriendAction::Decline => "decline",
            FriendAction::Block => "block",
        };
        f.write_str(s)
    }
}

impl FromStr for FriendAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(FriendAction::Accept),
            "decline" => Ok(FriendAction::Decline),
            "block" => Ok(FriendAction::Block),
            other => Err(format!("unknown friend action: {other}")),
        }
    }
}

/// One directed relationship row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendEdge {
    pub owner: UserId,
    pub target: UserId,
    pub status: EdgeStatus,
    pub created_at: DateTime<Utc>,
}
