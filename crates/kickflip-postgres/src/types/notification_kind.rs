//! Notification kind enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Why a notification was stored.
///
/// This enumeration corresponds to the `NOTIFICATION_KIND` PostgreSQL enum.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::NotificationKind"]
pub enum NotificationKind {
    /// Someone commented on the recipient's post.
    #[db_rename = "comment"]
    #[serde(rename = "comment")]
    Comment,

    /// Someone replied to the recipient's comment or reply.
    #[db_rename = "reply"]
    #[serde(rename = "reply")]
    Reply,
}

impl From<kickflip_core::model::NotificationKind> for NotificationKind {
    fn from(value: kickflip_core::model::NotificationKind) -> Self {
        use kickflip_core::model::NotificationKind as Kind;

        match value {
            Kind::Comment => Self::Comment,
            Kind::Reply => Self::Reply,
        }
    }
}

impl From<NotificationKind> for kickflip_core::model::NotificationKind {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Comment => Self::Comment,
            NotificationKind::Reply => Self::Reply,
        }
    }
}
