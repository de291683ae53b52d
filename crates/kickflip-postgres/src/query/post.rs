//! Posts repository.

use std::future::Future;

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewPostRow, PostRow};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for post table operations.
pub trait PostRepository {
    /// Inserts a post with a zero comment count.
    fn create_post(&mut self, post: NewPostRow) -> impl Future<Output = PgResult<PostRow>> + Send;

    /// Finds a post by its id.
    fn find_post_by_id(
        &mut self,
        post_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PostRow>>> + Send;

    /// Adds `delta` to the comment count of a post in one statement.
    ///
    /// Fails with a not-found query error when the post does not exist.
    fn increment_post_comment_count(
        &mut self,
        post_id: Uuid,
        delta: i64,
    ) -> impl Future<Output = PgResult<()>> + Send;
}

impl PostRepository for PgConnection {
    async fn create_post(&mut self, post: NewPostRow) -> PgResult<PostRow> {
        use schema::posts;

        diesel::insert_into(posts::table)
            .values(&post)
            .returning(PostRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_post_by_id(&mut self, post_id: Uuid) -> PgResult<Option<PostRow>> {
        use schema::posts::{self, dsl};

        posts::table
            .filter(dsl::id.eq(post_id))
            .select(PostRow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn increment_post_comment_count(&mut self, post_id: Uuid, delta: i64) -> PgResult<()> {
        use schema::posts::{self, dsl};

        let updated = diesel::update(posts::table.filter(dsl::id.eq(post_id)))
            .set(dsl::comment_count.eq(dsl::comment_count + delta))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        if updated == 0 {
            return Err(PgError::Query(DieselError::NotFound));
        }

        Ok(())
    }
}
