//! Repair of drifted denormalized counters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CommentService;
use crate::{CounterTarget, Error, Result, TRACING_TARGET_RECONCILE};

/// Result of comparing a stored counter against the nodes it counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub target: CounterTarget,
    /// Count derived from the stored nodes.
    pub expected: i64,
    /// Counter value before the repair.
    pub observed: i64,
    /// Delta applied to the counter; zero when it was already correct.
    pub applied_delta: i64,
}

impl Reconciliation {
    /// Returns whether the counter was already correct.
    pub fn was_consistent(&self) -> bool {
        self.applied_delta == 0
    }
}

impl CommentService {
    /// Recomputes a base comment's reply count from its stored replies.
    ///
    /// Drift is repaired with an atomic increment, never by overwriting the
    /// field. The delta comes from reading the counter and then counting the
    /// replies, so run this while the thread is quiet: an upload stored
    /// between the two reads whose increment lands afterwards is counted
    /// twice. Running it again once writes stop converges.
    #[tracing::instrument(skip_all, fields(base_id = %base_id))]
    pub async fn reconcile_thread(&self, base_id: Uuid) -> Result<Reconciliation> {
        let base = self
            .store
            .get(base_id)
            .await?
            .ok_or_else(|| Error::not_found().with_message(format!("comment {base_id}")))?;

        if !base.is_base() {
            return Err(Error::invalid_input()
                .with_message("only base comments carry a reply count"));
        }

        let expected = self.store.query_all_replies(base_id).await?.len() as i64;
        self.repair(CounterTarget::ReplyCount(base_id), expected, base.reply_count)
            .await
    }

    /// Recomputes a post's comment count from its stored nodes.
    ///
    /// Subject to the same race as [`reconcile_thread`]; run it on a quiet
    /// post.
    ///
    /// [`reconcile_thread`]: Self::reconcile_thread
    #[tracing::instrument(skip_all, fields(post_id = %post_id))]
    pub async fn reconcile_post(&self, post_id: Uuid) -> Result<Reconciliation> {
        let Some(posts) = &self.posts else {
            return Err(Error::internal().with_message("no post store configured"));
        };

        let post = posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found().with_message(format!("post {post_id}")))?;

        let expected = self.store.count_post_nodes(post_id).await?;
        self.repair(CounterTarget::PostCommentCount(post_id), expected, post.comment_count)
            .await
    }

    async fn repair(
        &self,
        target: CounterTarget,
        expected: i64,
        observed: i64,
    ) -> Result<Reconciliation> {
        let delta = expected - observed;

        if delta != 0 {
            target.apply(self.counters.as_ref(), delta).await?;
            tracing::warn!(
                target: TRACING_TARGET_RECONCILE,
                counter = %target,
                expected,
                observed,
                delta,
                "Counter drift repaired",
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_RECONCILE,
                counter = %target,
                expected,
                "Counter consistent",
            );
        }

        Ok(Reconciliation {
            target,
            expected,
            observed,
            applied_delta: delta,
        })
    }
}
