mod db;
mod friendship_repo_memory;
mod post_repo_memory;
mod user_repo_memory;

pub use db::{MemoryDb, MemoryTx};
pub use friendship_repo_memory::*;
pub use post_repo_memory::*;
pub use user_repo_memory::*;
