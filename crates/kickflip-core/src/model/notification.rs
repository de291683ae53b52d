use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Why a notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// Someone commented on the recipient's post.
    Comment,
    /// Someone replied to the recipient's comment or reply.
    Reply,
}

/// A notification handed to the dispatcher after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to_user_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Uuid,
    /// The newly created node.
    pub comment_id: Uuid,
    pub base_id: Uuid,
}
