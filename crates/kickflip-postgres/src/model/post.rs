//! Post model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use kickflip_core::model::PostSummary;
use uuid::Uuid;

use crate::schema::posts;

/// The columns of a post the comment subsystem depends on.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRow {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    /// Denormalized number of comments and replies.
    pub comment_count: i64,
    pub created_at: Timestamp,
}

/// Data for inserting a post.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPostRow {
    pub id: Uuid,
    pub owner_user_id: Uuid,
}

impl From<PostRow> for PostSummary {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            owner_user_id: row.owner_user_id,
            comment_count: row.comment_count,
        }
    }
}
