//! Storage seams consumed by the comment service.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;
use crate::model::{Comment, NewComment};
use crate::pagination::{CursorPage, CursorPagination};

/// Persistence for flat comment and reply records.
///
/// Implementations never cascade: removing a subtree is the service's job.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Assigns a fresh id and write timestamp, then persists the node.
    ///
    /// When `comment.base_id` is `None` the stored node becomes its own base.
    async fn insert(&self, comment: NewComment) -> Result<Comment>;

    /// Point lookup. Absence is `Ok(None)`, never an error.
    async fn get(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Base comments of a post, oldest first.
    async fn query_base_comments(
        &self,
        post_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>>;

    /// Every node sharing `base_id` except `exclude_id`, newest first.
    async fn query_replies(
        &self,
        base_id: Uuid,
        exclude_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>>;

    /// Unpaginated fetch of every node whose base is `base_id`, excluding the
    /// base itself.
    async fn query_all_replies(&self, base_id: Uuid) -> Result<Vec<Comment>>;

    /// Removes a single node. Returns `false` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Number of live base comments and replies of a post.
    async fn count_post_nodes(&self, post_id: Uuid) -> Result<i64>;
}

/// Atomic adjustments of the denormalized counters.
///
/// Every call is a single add at the store level, never a read followed by a
/// write. Repeating a call applies the delta twice.
#[async_trait]
pub trait CounterService: Send + Sync {
    /// Adds `delta` to the `reply_count` of a base comment.
    async fn increment_reply_count(&self, base_id: Uuid, delta: i64) -> Result<()>;

    /// Adds `delta` to the `comment_count` of a post.
    async fn increment_post_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()>;
}

/// A denormalized counter that may have drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "counter", content = "id", rename_all = "snake_case")]
pub enum CounterTarget {
    /// `reply_count` of a base comment.
    ReplyCount(Uuid),
    /// `comment_count` of a post.
    PostCommentCount(Uuid),
}

impl CounterTarget {
    /// Applies `delta` to this counter through `counters`.
    ///
    /// Failures are re-labelled as [`ErrorKind::CounterUpdateFailed`] naming
    /// the target.
    ///
    /// [`ErrorKind::CounterUpdateFailed`]: crate::ErrorKind::CounterUpdateFailed
    pub async fn apply(self, counters: &dyn CounterService, delta: i64) -> Result<()> {
        let result = match self {
            Self::ReplyCount(base_id) => counters.increment_reply_count(base_id, delta).await,
            Self::PostCommentCount(post_id) => {
                counters.increment_post_comment_count(post_id, delta).await
            }
        };

        result.map_err(|err| {
            crate::Error::counter_update_failed()
                .with_message(format!("failed to apply {delta:+} to {self}"))
                .with_source(err)
        })
    }
}

impl fmt::Display for CounterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplyCount(id) => write!(f, "reply_count of comment {id}"),
            Self::PostCommentCount(id) => write!(f, "comment_count of post {id}"),
        }
    }
}
