use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::FaultPlan;
use crate::model::{Comment, NewComment, PostSummary};
use crate::pagination::{CursorPage, CursorPagination};
use crate::{CommentStore, CounterService, Error, PostStore, Result};

#[derive(Debug)]
struct MemoryState {
    comments: HashMap<Uuid, Comment>,
    posts: HashMap<Uuid, PostSummary>,
    clock: Timestamp,
}

impl MemoryState {
    /// Returns a write time strictly greater than every previous one.
    fn tick(&mut self) -> Result<Timestamp> {
        let now = Timestamp::now();
        let next = if now > self.clock {
            now
        } else {
            self.clock
                .checked_add(SignedDuration::from_micros(1))
                .map_err(|err| Error::internal().with_source(err))?
        };

        self.clock = next;
        Ok(next)
    }
}

/// Comments, posts and counters held in process memory.
///
/// Clones share state. Every operation takes the lock once, so each counter
/// update is atomic with respect to every other call.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    faults: Arc<FaultPlan>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let state = MemoryState {
            comments: HashMap::new(),
            posts: HashMap::new(),
            clock: Timestamp::UNIX_EPOCH,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            faults: Arc::new(FaultPlan::default()),
        }
    }

    /// Returns the fault switches of this store.
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Creates a post with no comments and returns its id.
    pub async fn create_post(&self, owner_user_id: Uuid) -> Uuid {
        let post = PostSummary {
            id: Uuid::now_v7(),
            owner_user_id,
            comment_count: 0,
        };
        let id = post.id;
        self.state.write().await.posts.insert(id, post);
        id
    }

    /// Reads a post, bypassing fault injection.
    pub async fn post(&self, post_id: Uuid) -> Option<PostSummary> {
        self.state.read().await.posts.get(&post_id).cloned()
    }

    /// Reads a comment, bypassing fault injection.
    pub async fn comment(&self, id: Uuid) -> Option<Comment> {
        self.state.read().await.comments.get(&id).cloned()
    }

    /// Number of stored nodes across all posts.
    pub async fn len(&self) -> usize {
        self.state.read().await.comments.len()
    }

    /// Returns whether no nodes are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Cuts sorted items down to one page.
fn page_of(mut items: Vec<Comment>, pagination: &CursorPagination) -> CursorPage<Comment> {
    items.truncate(pagination.limit_usize());
    CursorPage::new(items, pagination, Comment::sort_key)
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        self.faults.check_store()?;

        let mut state = self.state.write().await;
        let id = Uuid::now_v7();
        let created_at = state.tick()?;

        let stored = Comment {
            id,
            post_id: comment.post_id,
            base_id: comment.base_id.unwrap_or(id),
            parent_id: comment.parent_id,
            owner_user_id: comment.owner_user_id,
            content: comment.content,
            reply_to_username: comment.reply_to_username,
            created_at,
            reply_count: 0,
        };

        state.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        self.faults.check_store()?;
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn query_base_comments(
        &self,
        post_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>> {
        self.faults.check_store()?;

        let state = self.state.read().await;
        let mut items: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.is_base())
            .filter(|c| pagination.admits(c.created_at, c.id))
            .cloned()
            .collect();
        items.sort_by_key(Comment::sort_key);

        Ok(page_of(items, &pagination))
    }

    async fn query_replies(
        &self,
        base_id: Uuid,
        exclude_id: Uuid,
        pagination: CursorPagination,
    ) -> Result<CursorPage<Comment>> {
        self.faults.check_store()?;

        let state = self.state.read().await;
        let mut items: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.base_id == base_id && c.id != exclude_id && c.id != base_id)
            .filter(|c| pagination.admits(c.created_at, c.id))
            .cloned()
            .collect();
        items.sort_by_key(|c| Reverse(c.sort_key()));

        Ok(page_of(items, &pagination))
    }

    async fn query_all_replies(&self, base_id: Uuid) -> Result<Vec<Comment>> {
        self.faults.check_store()?;

        let state = self.state.read().await;
        let mut items: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.base_id == base_id && c.id != base_id)
            .cloned()
            .collect();
        items.sort_by_key(Comment::sort_key);

        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.faults.check_delete()?;
        Ok(self.state.write().await.comments.remove(&id).is_some())
    }

    async fn count_post_nodes(&self, post_id: Uuid) -> Result<i64> {
        self.faults.check_store()?;

        let state = self.state.read().await;
        let count = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .count();

        Ok(count as i64)
    }
}

#[async_trait]
impl CounterService for MemoryStore {
    async fn increment_reply_count(&self, base_id: Uuid, delta: i64) -> Result<()> {
        self.faults.check_counters()?;

        let mut state = self.state.write().await;
        let base = state
            .comments
            .get_mut(&base_id)
            .ok_or_else(|| Error::not_found().with_message(format!("comment {base_id}")))?;
        base.reply_count += delta;

        Ok(())
    }

    async fn increment_post_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()> {
        self.increment_comment_count(post_id, delta).await
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        self.faults.check_store()?;
        Ok(self.state.read().await.posts.get(&post_id).cloned())
    }

    async fn increment_comment_count(&self, post_id: Uuid, delta: i64) -> Result<()> {
        self.faults.check_counters()?;

        let mut state = self.state.write().await;
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| Error::not_found().with_message(format!("post {post_id}")))?;
        post.comment_count += delta;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::CursorScope;

    #[tokio::test]
    async fn insert_assigns_strictly_increasing_times() {
        let store = MemoryStore::new();
        let post_id = store.create_post(Uuid::now_v7()).await;

        let mut previous = None;
        for n in 0..50 {
            let comment = NewComment::base(post_id, Uuid::now_v7(), format!("#{n}"));
            let stored = store.insert(comment).await.unwrap();
            assert_eq!(stored.base_id, stored.id);
            if let Some(previous) = previous {
                assert!(stored.created_at > previous);
            }
            previous = Some(stored.created_at);
        }
    }

    #[tokio::test]
    async fn replies_are_newest_first() {
        let store = MemoryStore::new();
        let post_id = store.create_post(Uuid::now_v7()).await;
        let base = store
            .insert(NewComment::base(post_id, Uuid::now_v7(), "base"))
            .await
            .unwrap();

        let mut inserted = Vec::new();
        for n in 0..3 {
            let reply = NewComment::reply(&base, Uuid::now_v7(), format!("r{n}"));
            inserted.push(store.insert(reply).await.unwrap().id);
        }

        let page = store
            .query_replies(base.id, base.id, CursorPagination::new(CursorScope::Reply, 10))
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|c| c.id).collect();
        inserted.reverse();
        assert_eq!(ids, inserted);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn counters_fail_on_missing_targets() {
        let store = MemoryStore::new();
        assert!(store.increment_reply_count(Uuid::now_v7(), 1).await.is_err());
        assert!(
            store
                .increment_post_comment_count(Uuid::now_v7(), 1)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn store_outage_is_reported() {
        let store = MemoryStore::new();
        store.faults().set_store_down(true);
        let err = store.get(Uuid::now_v7()).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
