//! Comment model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use kickflip_core::model::{Comment, NewComment};
use uuid::Uuid;

use crate::schema::comments;

/// A stored base comment or reply.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    /// Unique comment identifier.
    pub id: Uuid,
    /// Post the comment belongs to.
    pub post_id: Uuid,
    /// Root of the thread; equal to `id` for base comments.
    pub base_id: Uuid,
    /// Node being replied to.
    pub parent_id: Option<Uuid>,
    /// Author of the comment.
    pub owner_user_id: Uuid,
    /// Comment text.
    pub content: String,
    /// Username of the parent's author at upload time.
    pub reply_to_username: Option<String>,
    /// Number of replies in the thread (base comments only).
    pub reply_count: i64,
    /// Timestamp when the comment was written.
    pub created_at: Timestamp,
}

/// Data for inserting a comment.
///
/// `created_at` is left to the column default so write order follows the
/// database clock.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub base_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub owner_user_id: Uuid,
    pub content: String,
    pub reply_to_username: Option<String>,
}

impl NewCommentRow {
    /// Assigns a fresh time-ordered id to a domain insert payload.
    ///
    /// A payload without `base_id` becomes its own base.
    pub fn assign_id(comment: NewComment) -> Self {
        let id = Uuid::now_v7();
        Self {
            id,
            post_id: comment.post_id,
            base_id: comment.base_id.unwrap_or(id),
            parent_id: comment.parent_id,
            owner_user_id: comment.owner_user_id,
            content: comment.content,
            reply_to_username: comment.reply_to_username,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            base_id: row.base_id,
            parent_id: row.parent_id,
            owner_user_id: row.owner_user_id,
            content: row.content,
            reply_to_username: row.reply_to_username,
            created_at: row.created_at.into(),
            reply_count: row.reply_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_payload_becomes_its_own_base() {
        let row = NewCommentRow::assign_id(NewComment::base(Uuid::now_v7(), Uuid::now_v7(), "hi"));
        assert_eq!(row.base_id, row.id);
        assert_eq!(row.parent_id, None);
    }

    #[test]
    fn reply_payload_keeps_its_thread() {
        let base_id = Uuid::now_v7();
        let parent_id = Uuid::now_v7();
        let payload = NewComment {
            post_id: Uuid::now_v7(),
            owner_user_id: Uuid::now_v7(),
            content: "ollie".into(),
            parent_id: Some(parent_id),
            base_id: Some(base_id),
            reply_to_username: Some("alice".into()),
        };

        let row = NewCommentRow::assign_id(payload);
        assert_eq!(row.base_id, base_id);
        assert_eq!(row.parent_id, Some(parent_id));
        assert_ne!(row.id, base_id);
    }
}
