//! `kickflip-core` storage seams backed by [`PgClient`].

use async_trait::async_trait;
use kickflip_core::model::{Comment, NewComment, Notification, PostSummary, UserSummary};
use kickflip_core::pagination::{CursorPage, CursorPagination};
use kickflip_core::{
    CommentStore, CounterService, NotificationDispatcher, PostStore, Result, UserDirectory,
};
use uuid::Uuid;

use crate::model::{NewCommentRow, NewNotificationRow};
use crate::query::{CommentRepository, NotificationRepository, PostRepository, UserRepository};
use crate::{PgClient, TRACING_TARGET_QUERY};

#[async_trait]
impl CommentStore for PgClient {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let mut conn = self.get_connection().await?;
        let row = conn.create_comment(NewCommentRow::assign_id(comment)).await?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            comment_id = %row.id,
            base_id = %row.base_id,
            "Comment inserted"
        );

        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        let mut conn = self.get_connection().await?;
        let row = conn.find_comment_by_id(id).await?;
        Ok(row.map(Comment::from))
    }

    async fn query_base_comments(
        &self,
        post_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>> {
        let mut conn = self.get_connection().await?;
        let page = conn.cursor_list_base_comments(post_id, &pagination).await?;
        Ok(page.map(Comment::from))
    }

    async fn query_replies(
        &self,
        base_id: Uuid,
        exclude_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>> {
        let mut conn = self.get_connection().await?;
        let page = conn
            .cursor_list_thread_replies(base_id, exclude_id, &pagination)
            .await?;
        Ok(page.map(Comment::from))
    }

    async fn query_all_replies(&self, base_id: Uuid) -> Result<Vec<Comment>> {
        let mut conn = self.get_connection().await?;
        let rows = conn.list_thread_replies(base_id).await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        Ok(conn.delete_comment(id).await?)
    }

    async fn count_post_nodes(&self, post_id: Uuid) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        Ok(conn.count_post_comments(post_id).await?)
    }
}

#[async_trait]
impl CounterService for PgClient {
    async fn increment_reply_count(&self, base_id: Uuid, delta: i64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.increment_reply_count(base_id, delta).await?;
        Ok(())
    }

    async fn increment_post_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.increment_post_comment_count(post_id, delta).await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgClient {
    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        let mut conn = self.get_connection().await?;
        let row = conn.find_post_by_id(post_id).await?;
        Ok(row.map(PostSummary::from))
    }

    async fn increment_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()> {
        CounterService::increment_post_comment_count(self, post_id, delta).await
    }
}

#[async_trait]
impl UserDirectory for PgClient {
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserSummary>> {
        let mut conn = self.get_connection().await?;
        let row = conn.find_user_by_id(user_id).await?;
        Ok(row.map(UserSummary::from))
    }
}

/// Notifications are persisted for the recipient's inbox.
#[async_trait]
impl NotificationDispatcher for PgClient {
    async fn send(&self, notification: Notification) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let row = conn
            .create_notification(NewNotificationRow::from(notification))
            .await?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            notification_id = %row.id,
            account_id = %row.account_id,
            kind = %row.kind,
            "Notification stored"
        );

        Ok(())
    }
}
