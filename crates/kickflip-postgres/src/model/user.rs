//! User model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use kickflip_core::model::UserSummary;
use uuid::Uuid;

use crate::schema::users;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUserRow {
    pub id: Uuid,
    pub username: String,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        Self::new(row.id, row.username)
    }
}
