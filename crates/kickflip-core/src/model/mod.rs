//! Domain records of the comment subsystem.

mod comment;
mod notification;
mod post;
mod record;
mod user;

pub use comment::{Comment, NewComment, UploadComment};
pub use notification::{Notification, NotificationKind};
pub use post::PostSummary;
pub use record::{CommentRecord, Page, ThreadReply};
pub use user::{DELETED_USER_NAME, UserSummary};
