//! Depth-first, chronologically tie-broken ordering of a thread.

use std::collections::{HashMap, HashSet};

use jiff::Timestamp;
use uuid::Uuid;

use crate::TRACING_TARGET_THREAD;
use crate::model::Comment;

/// A node that can be placed in a thread.
pub trait ThreadNode {
    /// Unique id of the node.
    fn node_id(&self) -> Uuid;

    /// Id of the node this one replies to.
    fn parent_node_id(&self) -> Option<Uuid>;

    /// Write time, the primary sibling sort key.
    fn created_at(&self) -> Timestamp;
}

impl ThreadNode for Comment {
    #[inline]
    fn node_id(&self) -> Uuid {
        self.id
    }

    #[inline]
    fn parent_node_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    #[inline]
    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// A node together with its distance from the base comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry<T> {
    pub node: T,
    /// 1 for a direct reply to the base.
    pub depth: usize,
}

/// Result of [`order_thread`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedThread<T> {
    /// Reachable nodes in display order.
    pub entries: Vec<ThreadEntry<T>>,
    /// Ids of nodes that are not reachable from the base within the depth
    /// bound, oldest first.
    pub orphaned: Vec<Uuid>,
}

impl<T> OrderedThread<T> {
    /// Returns an empty thread.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            orphaned: Vec::new(),
        }
    }

    /// Number of displayable nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing is displayable.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether some nodes could not be placed.
    pub fn has_orphans(&self) -> bool {
        !self.orphaned.is_empty()
    }

    /// Iterates over the displayable nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.node)
    }

    /// Consumes the thread, returning the displayable nodes in order.
    pub fn into_nodes(self) -> Vec<T> {
        self.entries.into_iter().map(|entry| entry.node).collect()
    }
}

/// Linearizes the replies of `base_id` for display.
///
/// Each direct reply of the base is followed by its own replies, recursively,
/// before the next direct reply. Siblings are sorted by `(created_at, id)`.
/// Nodes that cannot be reached from the base, including those deeper than
/// `max_depth`, are left out of the entries and listed in `orphaned`. Repeated
/// ids are emitted once. The traversal uses an explicit stack.
pub fn order_thread<T, I>(base_id: Uuid, nodes: I, max_depth: usize) -> OrderedThread<T>
where
    T: ThreadNode,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    let mut slots: Vec<Option<T>> = nodes
        .into_iter()
        .filter(|node| node.node_id() != base_id && seen.insert(node.node_id()))
        .map(Some)
        .collect();

    if slots.is_empty() {
        return OrderedThread::empty();
    }

    let key = |slot: &Option<T>| {
        slot.as_ref()
            .map(|node| (node.created_at(), node.node_id()))
    };

    let mut children: HashMap<Uuid, Vec<usize>> = HashMap::new();
    for (index, slot) in slots.iter().enumerate() {
        if let Some(parent_id) = slot.as_ref().and_then(T::parent_node_id) {
            children.entry(parent_id).or_default().push(index);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|&index| key(&slots[index]));
    }

    let mut entries = Vec::with_capacity(slots.len());
    let mut visited = HashSet::with_capacity(slots.len());
    let mut stack: Vec<(usize, usize)> = children
        .get(&base_id)
        .map(|siblings| siblings.iter().rev().map(|&index| (index, 1)).collect())
        .unwrap_or_default();

    while let Some((index, depth)) = stack.pop() {
        if depth > max_depth || !visited.insert(index) {
            continue;
        }

        let Some(node) = slots[index].take() else {
            continue;
        };

        if let Some(siblings) = children.get(&node.node_id()) {
            stack.extend(siblings.iter().rev().map(|&child| (child, depth + 1)));
        }

        entries.push(ThreadEntry { node, depth });
    }

    let mut remaining: Vec<(Timestamp, Uuid)> = slots.iter().filter_map(key).collect();
    remaining.sort();
    let orphaned: Vec<Uuid> = remaining.into_iter().map(|(_, id)| id).collect();

    if !orphaned.is_empty() {
        tracing::trace!(
            target: TRACING_TARGET_THREAD,
            base_id = %base_id,
            placed = entries.len(),
            orphaned = orphaned.len(),
            "Thread has unreachable nodes"
        );
    }

    OrderedThread { entries, orphaned }
}
