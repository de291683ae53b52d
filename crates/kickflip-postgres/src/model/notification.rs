//! Notification model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use kickflip_core::model::Notification;
use uuid::Uuid;

use crate::schema::notifications;
use crate::types::NotificationKind;

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    /// Recipient of the notification.
    pub account_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Uuid,
    /// The comment or reply that triggered the notification.
    pub comment_id: Uuid,
    pub base_id: Uuid,
    pub created_at: Timestamp,
}

/// Data for inserting a notification.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewNotificationRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Uuid,
    pub comment_id: Uuid,
    pub base_id: Uuid,
}

impl From<Notification> for NewNotificationRow {
    fn from(notification: Notification) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id: notification.to_user_id,
            kind: notification.kind.into(),
            post_id: notification.post_id,
            comment_id: notification.comment_id,
            base_id: notification.base_id,
        }
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            to_user_id: row.account_id,
            kind: row.kind.into(),
            post_id: row.post_id,
            comment_id: row.comment_id,
            base_id: row.base_id,
        }
    }
}
