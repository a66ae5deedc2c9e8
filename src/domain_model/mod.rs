mod friend;
mod post;
mod user;

pub use friend::*;
pub use post::*;
pub use user::*;
