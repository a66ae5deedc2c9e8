use super::db::{MemoryDb, Tables, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::collections::btree_map::Entry;

pub struct MemoryFriendshipRepo {
    db: MemoryDb,
}

impl MemoryFriendshipRepo {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }
}

fn store_err(e: anyhow::Error) -> RelationError {
    RelationError::StoreUnavailable(e.to_string())
}

// mirrors the foreign keys on the mysql schema
fn require_users(tables: &Tables, owner: UserId, target: UserId) -> Result<(), RelationError> {
    if tables.users.contains_key(&owner) && tables.users.contains_key(&target) {
        Ok(())
    } else {
        Err(RelationError::NotFound)
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MemoryFriendshipRepo {
    async fn lock_members_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(), RelationError> {
        // the transaction already holds the whole store
        let tx = downcast(tx).map_err(store_err)?;
        require_users(tx.tables(), pair.min(), pair.max())
    }

    async fn get_status_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError> {
        let tx = downcast(tx).map_err(store_err)?;
        Ok(tx.tables().edges.get(&(owner, target)).map(|e| e.status))
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(store_err)?;
        require_users(tx.tables(), owner, target)?;

        match tx.tables().edges.entry((owner, target)) {
            Entry::Occupied(_) => Err(RelationError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(FriendEdge {
                    owner,
                    target,
                    status,
                    created_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
        status: EdgeStatus,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(store_err)?;
        require_users(tx.tables(), owner, target)?;

        tx.tables()
            .edges
            .entry((owner, target))
            .and_modify(|edge| edge.status = status)
            .or_insert_with(|| FriendEdge {
                owner,
                target,
                status,
                created_at: Utc::now(),
            });

        Ok(())
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        owner: UserId,
        target: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx).map_err(store_err)?;
        Ok(tx.tables().edges.remove(&(owner, target)).is_some())
    }

    async fn get_status(
        &self,
        owner: UserId,
        target: UserId,
    ) -> Result<Option<EdgeStatus>, RelationError> {
        let tables = self.db.lock().await;
        Ok(tables.edges.get(&(owner, target)).map(|e| e.status))
    }

    async fn list_by_owner(
        &self,
        owner: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError> {
        let tables = self.db.lock().await;

        let mut edges: Vec<FriendEdge> = tables
            .edges
            .values()
            .filter(|e| e.owner == owner && status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        edges.sort_by_key(|e| (e.created_at, e.target));

        Ok(edges)
    }

    async fn list_by_target(
        &self,
        target: UserId,
        status: Option<EdgeStatus>,
    ) -> Result<Vec<FriendEdge>, RelationError> {
        let tables = self.db.lock().await;

        let mut edges: Vec<FriendEdge> = tables
            .edges
            .values()
            .filter(|e| e.target == target && status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        edges.sort_by_key(|e| (e.created_at, e.owner));

        Ok(edges)
    }
}
