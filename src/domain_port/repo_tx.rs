use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// An open store transaction. Dropping it without `commit` rolls it back.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    /// Lets a repo recover the concrete transaction of its own backend.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
