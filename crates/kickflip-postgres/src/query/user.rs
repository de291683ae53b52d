//! Users repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewUserRow, UserRow};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for user table operations.
pub trait UserRepository {
    /// Inserts a user.
    fn create_user(&mut self, user: NewUserRow) -> impl Future<Output = PgResult<UserRow>> + Send;

    /// Finds a user by id.
    fn find_user_by_id(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<UserRow>>> + Send;
}

impl UserRepository for PgConnection {
    async fn create_user(&mut self, user: NewUserRow) -> PgResult<UserRow> {
        use schema::users;

        diesel::insert_into(users::table)
            .values(&user)
            .returning(UserRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_user_by_id(&mut self, user_id: Uuid) -> PgResult<Option<UserRow>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::id.eq(user_id))
            .select(UserRow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }
}
