// repo

mod comment_repo;
mod friendship_repo;
mod like_repo;
mod post_repo;
mod user_repo;

mod repo_tx;

pub use comment_repo::*;
pub use friendship_repo::*;
pub use like_repo::*;
pub use post_repo::*;
pub use user_repo::*;

pub use repo_tx::*;
