//! Repository traits over a [`PgConnection`](crate::PgConnection).
//!
//! Each trait covers one table. Methods take `&mut self` and run a single
//! statement, so callers decide about connection reuse and transactions.

mod comment;
mod notification;
mod post;
mod user;

pub use comment::CommentRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use user::UserRepository;
