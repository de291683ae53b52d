//! Comments repository: flat storage of base comments and replies.

use std::future::Future;

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use kickflip_core::pagination::{CursorPage, CursorPagination};
use uuid::Uuid;

use crate::model::{CommentRow, NewCommentRow};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for comment table operations.
pub trait CommentRepository {
    /// Inserts a comment and returns the stored row.
    fn create_comment(
        &mut self,
        comment: NewCommentRow,
    ) -> impl Future<Output = PgResult<CommentRow>> + Send;

    /// Finds a comment by its id.
    fn find_comment_by_id(
        &mut self,
        comment_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<CommentRow>>> + Send;

    /// Lists base comments of a post, oldest first.
    fn cursor_list_base_comments(
        &mut self,
        post_id: Uuid,
        pagination: &CursorPagination,
    ) -> impl Future<Output = PgResult<CursorPage<CommentRow>>> + Send;

    /// Lists the nodes of a thread except `exclude_id`, newest first.
    fn cursor_list_thread_replies(
        &mut self,
        base_id: Uuid,
        exclude_id: Uuid,
        pagination: &CursorPagination,
    ) -> impl Future<Output = PgResult<CursorPage<CommentRow>>> + Send;

    /// Lists every reply of a thread, oldest first.
    fn list_thread_replies(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<CommentRow>>> + Send;

    /// Deletes one comment. Returns whether a row was removed.
    fn delete_comment(&mut self, comment_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;

    /// Counts comments and replies of a post.
    fn count_post_comments(&mut self, post_id: Uuid) -> impl Future<Output = PgResult<i64>> + Send;

    /// Adds `delta` to the reply count of a base comment in one statement.
    ///
    /// Fails with a not-found query error when the comment does not exist.
    fn increment_reply_count(
        &mut self,
        base_id: Uuid,
        delta: i64,
    ) -> impl Future<Output = PgResult<()>> + Send;
}

fn cursor_key(row: &CommentRow) -> (jiff::Timestamp, Uuid) {
    (row.created_at.into(), row.id)
}

impl CommentRepository for PgConnection {
    async fn create_comment(&mut self, comment: NewCommentRow) -> PgResult<CommentRow> {
        use schema::comments;

        let comment = diesel::insert_into(comments::table)
            .values(&comment)
            .returning(CommentRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(comment)
    }

    async fn find_comment_by_id(&mut self, comment_id: Uuid) -> PgResult<Option<CommentRow>> {
        use schema::comments::{self, dsl};

        comments::table
            .filter(dsl::id.eq(comment_id))
            .select(CommentRow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn cursor_list_base_comments(
        &mut self,
        post_id: Uuid,
        pagination: &CursorPagination,
    ) -> PgResult<CursorPage<CommentRow>> {
        use schema::comments::{self, dsl};

        let mut query = comments::table
            .filter(dsl::post_id.eq(post_id))
            .filter(dsl::parent_id.is_null())
            .select(CommentRow::as_select())
            .into_boxed();

        if let Some(cursor) = &pagination.after {
            let cursor_time = jiff_diesel::Timestamp::from(cursor.timestamp);
            query = query.filter(
                dsl::created_at
                    .gt(cursor_time)
                    .or(dsl::created_at.eq(cursor_time).and(dsl::id.gt(cursor.id))),
            );
        }

        let items: Vec<CommentRow> = query
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .limit(pagination.limit)
            .load(self)
            .await
            .map_err(PgError::from)?;

        tracing::trace!(
            target: TRACING_TARGET_QUERY,
            post_id = %post_id,
            count = items.len(),
            "Loaded base comments"
        );

        Ok(CursorPage::new(items, pagination, cursor_key))
    }

    async fn cursor_list_thread_replies(
        &mut self,
        base_id: Uuid,
        exclude_id: Uuid,
        pagination: &CursorPagination,
    ) -> PgResult<CursorPage<CommentRow>> {
        use schema::comments::{self, dsl};

        let mut query = comments::table
            .filter(dsl::base_id.eq(base_id))
            .filter(dsl::id.ne(exclude_id))
            .select(CommentRow::as_select())
            .into_boxed();

        if let Some(cursor) = &pagination.after {
            let cursor_time = jiff_diesel::Timestamp::from(cursor.timestamp);
            query = query.filter(
                dsl::created_at
                    .lt(cursor_time)
                    .or(dsl::created_at.eq(cursor_time).and(dsl::id.lt(cursor.id))),
            );
        }

        let items: Vec<CommentRow> = query
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .limit(pagination.limit)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(CursorPage::new(items, pagination, cursor_key))
    }

    async fn list_thread_replies(&mut self, base_id: Uuid) -> PgResult<Vec<CommentRow>> {
        use schema::comments::{self, dsl};

        comments::table
            .filter(dsl::base_id.eq(base_id))
            .filter(dsl::id.ne(base_id))
            .select(CommentRow::as_select())
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn delete_comment(&mut self, comment_id: Uuid) -> PgResult<bool> {
        use schema::comments::{self, dsl};

        let deleted = diesel::delete(comments::table.filter(dsl::id.eq(comment_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn count_post_comments(&mut self, post_id: Uuid) -> PgResult<i64> {
        use schema::comments::{self, dsl};

        comments::table
            .filter(dsl::post_id.eq(post_id))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn increment_reply_count(&mut self, base_id: Uuid, delta: i64) -> PgResult<()> {
        use schema::comments::{self, dsl};

        let updated = diesel::update(comments::table.filter(dsl::id.eq(base_id)))
            .set(dsl::reply_count.eq(dsl::reply_count + delta))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        if updated == 0 {
            return Err(PgError::Query(DieselError::NotFound));
        }

        Ok(())
    }
}
