//! Column types and constraint names shared by the models and queries.

mod constraint;
mod notification_kind;

pub use constraint::CommentConstraints;
pub use notification_kind::NotificationKind;
