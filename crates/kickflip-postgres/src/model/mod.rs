//! Database models for every table of the comment subsystem.
//!
//! Each table has a `Queryable` row type and an `Insertable` payload. Row
//! types convert into the `kickflip-core` domain model.

mod comment;
mod notification;
mod post;
mod user;

pub use comment::{CommentRow, NewCommentRow};
pub use notification::{NewNotificationRow, NotificationRow};
pub use post::{NewPostRow, PostRow};
pub use user::{NewUserRow, UserRow};
