//! Deletion of comments and replies, inline or as an observable job.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use super::CommentService;
use crate::model::Comment;
use crate::{CounterTarget, Error, ErrorKind, OrphanPolicy, Result, TRACING_TARGET_SERVICE};

/// What a delete actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Nodes removed from the store, descendants before ancestors.
    pub removed: Vec<Uuid>,
    /// Counters that could not be decremented and have drifted.
    pub counter_failures: Vec<CounterTarget>,
}

impl DeleteOutcome {
    /// Returns whether nothing was removed.
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty()
    }

    /// Returns whether every counter was kept in step.
    pub fn counters_consistent(&self) -> bool {
        self.counter_failures.is_empty()
    }
}

/// Progress of a [`DeletionJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Spawned but not yet polled.
    Pending,
    /// Removing nodes.
    Running,
    /// Finished; carries what was removed.
    Completed(DeleteOutcome),
    /// Stopped with an error, possibly after removing some nodes.
    Failed { kind: ErrorKind, message: String },
}

impl JobStatus {
    /// Returns whether the job has stopped.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }
}

/// Handle to a delete running in the background.
///
/// Dropping the handle does not cancel the job.
#[derive(Debug, Clone)]
pub struct DeletionJob {
    comment_id: Uuid,
    status: watch::Receiver<JobStatus>,
}

impl DeletionJob {
    /// Id of the node being deleted.
    pub fn comment_id(&self) -> Uuid {
        self.comment_id
    }

    /// Returns the current status without waiting.
    pub fn status(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// Waits for the job to finish.
    pub async fn wait(mut self) -> Result<DeleteOutcome> {
        let status = self
            .status
            .wait_for(JobStatus::is_finished)
            .await
            .map_err(|_| Error::internal().with_message("deletion job ended without a result"))?
            .clone();

        match status {
            JobStatus::Completed(outcome) => Ok(outcome),
            JobStatus::Failed { kind, message } => Err(Error::new(kind).with_message(message)),
            JobStatus::Pending | JobStatus::Running => {
                Err(Error::internal().with_message("deletion job did not finish"))
            }
        }
    }
}

impl CommentService {
    /// Deletes a base comment with its whole thread, or a single reply.
    ///
    /// Deleting an absent node succeeds with an empty outcome. Under
    /// [`OrphanPolicy::Keep`] a reply's own replies stay in storage; under
    /// [`OrphanPolicy::Cascade`] they are removed with it.
    ///
    /// Counters are decremented by the number of nodes actually removed. If
    /// the store fails partway through, that decrement still happens before
    /// the error is returned.
    #[tracing::instrument(skip_all, fields(comment_id = %comment_id))]
    pub async fn delete(&self, comment_id: Uuid) -> Result<DeleteOutcome> {
        let Some(node) = self.store.get(comment_id).await? else {
            tracing::debug!(
                target: TRACING_TARGET_SERVICE,
                "Comment already deleted",
            );
            return Ok(DeleteOutcome::default());
        };

        let targets = self.deletion_targets(&node).await?;
        let mut outcome = DeleteOutcome::default();
        let result = self.remove_all(&targets, &mut outcome.removed).await;

        let base_removed = node.is_base() && outcome.removed.contains(&node.id);
        let replies_removed = outcome.removed.len() as i64 - i64::from(base_removed);

        if !base_removed {
            let target = CounterTarget::ReplyCount(node.base_id);
            if !self.adjust(target, -replies_removed).await {
                outcome.counter_failures.push(target);
            }
        }

        let target = CounterTarget::PostCommentCount(node.post_id);
        if !self.adjust(target, -(outcome.removed.len() as i64)).await {
            outcome.counter_failures.push(target);
        }

        if let Err(err) = result {
            tracing::error!(
                target: TRACING_TARGET_SERVICE,
                removed = outcome.removed.len(),
                planned = targets.len(),
                error = %err,
                "Delete stopped partway, thread left for reconciliation",
            );
            return Err(err);
        }

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            base_id = %node.base_id,
            removed = outcome.removed.len(),
            "Comment deleted",
        );

        Ok(outcome)
    }

    /// Runs [`delete`] on a background task.
    ///
    /// [`delete`]: Self::delete
    pub fn spawn_delete(&self, comment_id: Uuid) -> DeletionJob {
        let (sender, status) = watch::channel(JobStatus::Pending);
        let service = self.clone();

        tokio::spawn(async move {
            sender.send_replace(JobStatus::Running);

            let status = match service.delete(comment_id).await {
                Ok(outcome) => JobStatus::Completed(outcome),
                Err(err) => JobStatus::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                },
            };

            sender.send_replace(status);
        });

        DeletionJob { comment_id, status }
    }

    /// Lists the nodes to remove, every descendant before its ancestor.
    async fn deletion_targets(&self, node: &Comment) -> Result<Vec<Uuid>> {
        if node.is_base() {
            // Replies are written after their parents, so newest first
            // removes children before parents.
            let replies = self.store.query_all_replies(node.id).await?;
            let mut targets: Vec<Uuid> = replies.iter().rev().map(|reply| reply.id).collect();
            targets.push(node.id);
            return Ok(targets);
        }

        match self.config.orphan_policy {
            OrphanPolicy::Keep => Ok(vec![node.id]),
            OrphanPolicy::Cascade => {
                let replies = self.store.query_all_replies(node.base_id).await?;
                Ok(subtree_leaves_first(node.id, &replies))
            }
        }
    }

    async fn remove_all(&self, targets: &[Uuid], removed: &mut Vec<Uuid>) -> Result<()> {
        for &id in targets {
            if self.store.delete(id).await? {
                removed.push(id);
            }
        }

        Ok(())
    }
}

/// Ids of `root` and its transitive descendants among `replies`, each node
/// listed after all of its descendants.
fn subtree_leaves_first(root: Uuid, replies: &[Comment]) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            children.entry(parent_id).or_default().push(reply.id);
        }
    }

    let mut visited = HashSet::from([root]);
    let mut order = vec![root];
    let mut next = 0;
    while let Some(&id) = order.get(next) {
        next += 1;
        for &child in children.get(&id).into_iter().flatten() {
            if visited.insert(child) {
                order.push(child);
            }
        }
    }

    order.reverse();
    order
}
