//! Narrow interfaces to the systems surrounding the comment subsystem.

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;
use crate::model::{Notification, PostSummary, UserSummary};

/// Tracing target for collaborator calls.
const TRACING_TARGET: &str = "kickflip_core::collaborator";

/// Post storage owned by the feed subsystem.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Looks a post up by id.
    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>>;

    /// Atomically adds `delta` to the post's comment count.
    async fn increment_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()>;
}

/// Read access to user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetches a user by id.
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserSummary>>;
}

/// Outbound notifications. Delivery is fire-and-forget from the caller's
/// point of view.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Hands a notification over for delivery.
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// A dispatcher that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn send(&self, notification: Notification) -> Result<()> {
        tracing::trace!(
            target: TRACING_TARGET,
            to_user_id = %notification.to_user_id,
            kind = notification.kind.as_ref(),
            "Dropping notification"
        );
        Ok(())
    }
}

/// Resolves a user for display.
///
/// Lookup failures and unknown ids degrade to the deleted-user placeholder.
pub async fn resolve_user(directory: &dyn UserDirectory, user_id: Uuid) -> UserSummary {
    match directory.fetch_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(
                target: TRACING_TARGET,
                user_id = %user_id,
                "User not found, using placeholder"
            );
            UserSummary::deleted(user_id)
        }
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET,
                user_id = %user_id,
                error = %err,
                "User lookup failed, using placeholder"
            );
            UserSummary::deleted(user_id)
        }
    }
}
