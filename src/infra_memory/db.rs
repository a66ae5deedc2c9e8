use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager, UserRecord};
use anyhow::anyhow;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub users: BTreeMap<UserId, UserRecord>,
    pub edges: BTreeMap<(UserId, UserId), FriendEdge>,
    pub posts: BTreeMap<PostId, Post>,
    pub comments: BTreeMap<CommentId, Comment>,
    pub likes: BTreeSet<(PostId, UserId)>,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    pub fn next_post_id(&mut self) -> PostId {
        self.next_post_id += 1;
        PostId(self.next_post_id)
    }

    pub fn next_comment_id(&mut self) -> CommentId {
        self.next_comment_id += 1;
        CommentId(self.next_comment_id)
    }
}

/// Process-local store used by the `memory` backend and the test suite.
/// Meant for development and tests only: nothing is persisted, and every
/// transaction copies all tables, so writes cost O(total data).
///
/// A transaction holds the table lock from `begin` until it is committed or
/// dropped, so transactions never interleave. Writes go to a staged copy and
/// only replace the live tables on commit.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryDb {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let live = self.tables.clone().lock_owned().await;
        let staged = live.clone();
        Ok(Box::new(MemoryTx { live, staged }))
    }
}

pub struct MemoryTx {
    live: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl MemoryTx {
    pub(crate) fn tables(&mut self) -> &mut Tables {
        &mut self.staged
    }
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut live, staged } = *self;
        *live = staged;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MemoryTx> {
    tx.as_any_mut()
        .downcast_mut::<MemoryTx>()
        .ok_or_else(|| anyhow!("transaction was not opened by the memory backend"))
}
