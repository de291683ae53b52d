use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::model::Comment;
use crate::thread::{ThreadEntry, order_thread};

/// Local caches of a presenter. Never held across an `.await`.
#[derive(Debug, Default)]
pub(super) struct PresenterState {
    pub base_comments: Vec<Comment>,
    pub replies_by_base: HashMap<Uuid, Vec<ThreadEntry<Comment>>>,
    pub expanded: HashSet<Uuid>,
    /// Ids of optimistic placeholders awaiting the service.
    pub pending: HashSet<Uuid>,
    pub next_cursor: Option<String>,
    pub exhausted: bool,
}

impl PresenterState {
    pub fn base_mut(&mut self, base_id: Uuid) -> Option<&mut Comment> {
        self.base_comments.iter_mut().find(|c| c.id == base_id)
    }

    /// Appends base comments that are not cached yet, returning how many.
    pub fn append_bases(&mut self, items: Vec<Comment>) -> usize {
        let before = self.base_comments.len();
        for item in items {
            if !self.base_comments.iter().any(|c| c.id == item.id) {
                self.base_comments.push(item);
            }
        }
        self.base_comments.len() - before
    }

    /// Finds the thread a cached node belongs to and its depth in it.
    pub fn locate(&self, id: Uuid) -> Option<(Uuid, usize)> {
        if self.base_comments.iter().any(|c| c.id == id) {
            return Some((id, 0));
        }

        self.replies_by_base.iter().find_map(|(base_id, entries)| {
            entries
                .iter()
                .find(|entry| entry.node.id == id)
                .map(|entry| (*base_id, entry.depth))
        })
    }

    /// Re-linearizes a cached thread after its node set changed.
    pub fn reorder(&mut self, base_id: Uuid, max_depth: usize) {
        let Some(entries) = self.replies_by_base.remove(&base_id) else {
            return;
        };

        let nodes = entries.into_iter().map(|entry| entry.node);
        let thread = order_thread(base_id, nodes, max_depth);
        self.replies_by_base.insert(base_id, thread.entries);
    }

    /// Drops every trace of a base comment.
    pub fn remove_base(&mut self, base_id: Uuid) -> bool {
        let before = self.base_comments.len();
        self.base_comments.retain(|c| c.id != base_id);
        self.replies_by_base.remove(&base_id);
        self.expanded.remove(&base_id);
        before != self.base_comments.len()
    }

    /// Removes the given replies from a cached thread, returning how many
    /// were present.
    pub fn remove_replies(&mut self, base_id: Uuid, ids: &HashSet<Uuid>) -> usize {
        let Some(entries) = self.replies_by_base.get_mut(&base_id) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|entry| !ids.contains(&entry.node.id));
        before - entries.len()
    }
}
