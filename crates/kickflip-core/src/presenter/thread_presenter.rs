use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use jiff::Timestamp;
use uuid::Uuid;

use super::state::PresenterState;
use crate::model::{Comment, UploadComment};
use crate::service::{CommentService, DeleteOutcome};
use crate::thread::ThreadEntry;
use crate::{Error, Result, TRACING_TARGET_PRESENTER};

/// One line of a rendered comment section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub comment: Comment,
    /// 0 for a base comment, 1 for a direct reply, and so on.
    pub depth: usize,
    /// Whether this row is an optimistic placeholder.
    pub pending: bool,
}

/// Cached, optimistic view of the comments on one post.
///
/// State sits behind a mutex that is released before every service call, so
/// paging, expanding and submitting may run concurrently.
#[derive(Debug)]
pub struct ThreadPresenter {
    service: CommentService,
    post_id: Uuid,
    viewer_id: Uuid,
    state: Mutex<PresenterState>,
}

impl ThreadPresenter {
    /// Creates a presenter for `post_id` acting as `viewer_id`.
    pub fn new(service: CommentService, post_id: Uuid, viewer_id: Uuid) -> Self {
        Self {
            service,
            post_id,
            viewer_id,
            state: Mutex::new(PresenterState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PresenterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether more base comments may be fetched.
    pub fn has_more(&self) -> bool {
        !self.state().exhausted
    }

    /// Returns whether a thread is expanded.
    pub fn is_expanded(&self, base_id: Uuid) -> bool {
        self.state().expanded.contains(&base_id)
    }

    /// Returns the cached base comments.
    pub fn base_comments(&self) -> Vec<Comment> {
        self.state().base_comments.clone()
    }

    /// Returns the cached replies of a thread in display order, if loaded.
    pub fn replies(&self, base_id: Uuid) -> Option<Vec<Comment>> {
        self.state()
            .replies_by_base
            .get(&base_id)
            .map(|entries| entries.iter().map(|entry| entry.node.clone()).collect())
    }

    /// Fetches the next page of base comments and appends it.
    ///
    /// Returns the number of comments added; zero once the post is exhausted.
    pub async fn load_more_base_comments(&self) -> Result<usize> {
        let cursor = {
            let state = self.state();
            if state.exhausted {
                return Ok(0);
            }
            state.next_cursor.clone()
        };

        let page = self
            .service
            .get_thread_page(self.post_id, None, cursor.as_deref())
            .await?;

        let mut state = self.state();
        state.exhausted = page.next_cursor.is_none();
        state.next_cursor = page.next_cursor;
        let added = state.append_bases(page.items);

        tracing::debug!(
            target: TRACING_TARGET_PRESENTER,
            post_id = %self.post_id,
            added,
            exhausted = state.exhausted,
            "Base comments loaded",
        );

        Ok(added)
    }

    /// Expands or collapses a thread, returning the new expansion state.
    ///
    /// Replies are fetched on the first expansion only.
    pub async fn toggle_expanded(&self, base_id: Uuid) -> Result<bool> {
        {
            let mut state = self.state();
            if state.expanded.remove(&base_id) {
                return Ok(false);
            }
            if state.replies_by_base.contains_key(&base_id) {
                state.expanded.insert(base_id);
                return Ok(true);
            }
        }

        let thread = self.service.get_replies(base_id).await?;

        let mut state = self.state();
        state
            .replies_by_base
            .entry(base_id)
            .or_insert(thread.entries);
        state.expanded.insert(base_id);

        Ok(true)
    }

    /// Posts a base comment, showing it at the head before the service
    /// confirms it.
    pub async fn submit_comment(&self, content: &str) -> Result<Comment> {
        let placeholder_id = Uuid::new_v4();
        let placeholder = Comment {
            id: placeholder_id,
            post_id: self.post_id,
            base_id: placeholder_id,
            parent_id: None,
            owner_user_id: self.viewer_id,
            content: content.to_owned(),
            reply_to_username: None,
            created_at: Timestamp::now(),
            reply_count: 0,
        };

        {
            let mut state = self.state();
            state.base_comments.insert(0, placeholder);
            state.pending.insert(placeholder_id);
        }

        let request = UploadComment::comment(self.post_id, self.viewer_id, content);
        let result = self.service.upload(request).await;

        let mut state = self.state();
        state.pending.remove(&placeholder_id);
        let slot = state
            .base_comments
            .iter()
            .position(|c| c.id == placeholder_id);

        match result {
            Ok(stored) => {
                match slot {
                    Some(index) => state.base_comments[index] = stored.clone(),
                    None => state.base_comments.insert(0, stored.clone()),
                }
                Ok(stored)
            }
            Err(err) => {
                if let Some(index) = slot {
                    state.base_comments.remove(index);
                }
                tracing::debug!(
                    target: TRACING_TARGET_PRESENTER,
                    error = %err,
                    "Optimistic comment rolled back",
                );
                Err(err)
            }
        }
    }

    /// Posts a reply to a base comment or to another reply.
    ///
    /// The base comment's local reply count is bumped immediately, and the
    /// reply is shown at the head of the thread if its replies are loaded.
    pub async fn submit_reply(&self, parent_id: Uuid, content: &str) -> Result<Comment> {
        let located = self.state().locate(parent_id);
        let (base_id, parent_depth) = match located {
            Some(found) => found,
            None => {
                let parent = self.service.get_comment(parent_id).await?.ok_or_else(|| {
                    Error::not_found().with_message(format!("parent comment {parent_id}"))
                })?;
                (parent.base_id, 0)
            }
        };

        let placeholder_id = Uuid::new_v4();
        let placeholder = Comment {
            id: placeholder_id,
            post_id: self.post_id,
            base_id,
            parent_id: Some(parent_id),
            owner_user_id: self.viewer_id,
            content: content.to_owned(),
            reply_to_username: None,
            created_at: Timestamp::now(),
            reply_count: 0,
        };

        {
            let mut state = self.state();
            if let Some(entries) = state.replies_by_base.get_mut(&base_id) {
                entries.insert(
                    0,
                    ThreadEntry {
                        node: placeholder,
                        depth: parent_depth + 1,
                    },
                );
            }
            if let Some(base) = state.base_mut(base_id) {
                base.reply_count += 1;
            }
            state.pending.insert(placeholder_id);
        }

        let request = UploadComment::reply(self.post_id, self.viewer_id, parent_id, content);
        let result = self.service.upload(request).await;

        let max_depth = self.service.config().max_thread_depth;
        let mut state = self.state();
        state.pending.remove(&placeholder_id);

        match result {
            Ok(stored) => {
                if let Some(entries) = state.replies_by_base.get_mut(&base_id) {
                    match entries.iter_mut().find(|e| e.node.id == placeholder_id) {
                        Some(entry) => entry.node = stored.clone(),
                        None => entries.push(ThreadEntry {
                            node: stored.clone(),
                            depth: parent_depth + 1,
                        }),
                    }
                }
                state.reorder(base_id, max_depth);
                Ok(stored)
            }
            Err(err) => {
                state.remove_replies(base_id, &HashSet::from([placeholder_id]));
                if let Some(base) = state.base_mut(base_id) {
                    base.reply_count -= 1;
                }
                tracing::debug!(
                    target: TRACING_TARGET_PRESENTER,
                    base_id = %base_id,
                    error = %err,
                    "Optimistic reply rolled back",
                );
                Err(err)
            }
        }
    }

    /// Deletes a node through the service, then drops what the service
    /// removed from the local caches. When the delete fails, the thread is
    /// re-fetched so rows removed before the failure disappear too.
    pub async fn delete_node(&self, id: Uuid) -> Result<DeleteOutcome> {
        let located = self.state().locate(id).map(|(base_id, _)| base_id);
        let base_id = match located {
            Some(base_id) => Some(base_id),
            None => self.service.get_comment(id).await?.map(|c| c.base_id),
        };

        let outcome = match self.service.delete(id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Part of the thread may already be gone.
                if let Some(base_id) = base_id {
                    self.resync_thread(base_id).await;
                }
                return Err(err);
            }
        };

        let Some(base_id) = base_id else {
            return Ok(outcome);
        };

        let max_depth = self.service.config().max_thread_depth;
        let mut state = self.state();

        if base_id == id {
            state.remove_base(id);
            return Ok(outcome);
        }

        let mut removed: HashSet<Uuid> = outcome.removed.iter().copied().collect();
        removed.insert(id);
        let dropped = state.remove_replies(base_id, &removed);
        let decrement = match outcome.removed.len() {
            0 => dropped,
            n => n,
        };

        if let Some(base) = state.base_mut(base_id) {
            base.reply_count -= decrement as i64;
        }
        state.reorder(base_id, max_depth);

        Ok(outcome)
    }

    /// Replaces the cached copy of a thread with what the service holds now.
    async fn resync_thread(&self, base_id: Uuid) {
        let fetched = async {
            let base = self.service.get_comment(base_id).await?;
            let thread = self.service.get_replies(base_id).await?;
            Ok::<_, Error>((base, thread))
        }
        .await;

        let (base, thread) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_PRESENTER,
                    base_id = %base_id,
                    error = %err,
                    "Thread resync failed, cached rows may be stale",
                );
                return;
            }
        };

        let mut state = self.state();
        let Some(base) = base else {
            state.remove_base(base_id);
            return;
        };

        if let Some(cached) = state.base_mut(base_id) {
            *cached = base;
        }
        if let Some(entries) = state.replies_by_base.get_mut(&base_id) {
            *entries = thread.entries;
        }
    }

    /// Returns the rows to render: each base comment followed, when
    /// expanded, by its replies in display order.
    pub fn snapshot(&self) -> Vec<ThreadRow> {
        let state = self.state();
        let mut rows = Vec::new();

        for base in &state.base_comments {
            rows.push(ThreadRow {
                comment: base.clone(),
                depth: 0,
                pending: state.pending.contains(&base.id),
            });

            if !state.expanded.contains(&base.id) {
                continue;
            }

            let replies = state.replies_by_base.get(&base.id).into_iter().flatten();
            for entry in replies {
                rows.push(ThreadRow {
                    comment: entry.node.clone(),
                    depth: entry.depth,
                    pending: state.pending.contains(&entry.node.id),
                });
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;
    use crate::{CommentConfig, OrphanPolicy};

    struct Fixture {
        store: MemoryStore,
        service: CommentService,
        presenter: ThreadPresenter,
        post_id: Uuid,
        viewer: Uuid,
    }

    async fn fixture(config: CommentConfig) -> Fixture {
        let store = MemoryStore::new();
        let viewer = Uuid::now_v7();
        let post_id = store.create_post(Uuid::now_v7()).await;
        let service = CommentService::from_backend(store.clone()).with_config(config);
        let presenter = ThreadPresenter::new(service.clone(), post_id, viewer);

        Fixture {
            store,
            service,
            presenter,
            post_id,
            viewer,
        }
    }

    async fn seed(fx: &Fixture, content: &str, parent_id: Option<Uuid>) -> Comment {
        let request = UploadComment {
            post_id: fx.post_id,
            owner_user_id: Uuid::now_v7(),
            content: content.into(),
            parent_id,
        };
        fx.service.upload(request).await.unwrap()
    }

    fn contents(rows: &[ThreadRow]) -> Vec<(String, usize)> {
        rows.iter()
            .map(|row| (row.comment.content.clone(), row.depth))
            .collect()
    }

    #[tokio::test]
    async fn loads_pages_until_exhausted() {
        let config = CommentConfig {
            default_page_size: 2,
            ..CommentConfig::default()
        };
        let fx = fixture(config).await;
        for n in 0..5 {
            seed(&fx, &format!("c{n}"), None).await;
        }

        assert_eq!(fx.presenter.load_more_base_comments().await.unwrap(), 2);
        assert_eq!(fx.presenter.load_more_base_comments().await.unwrap(), 2);
        assert_eq!(fx.presenter.load_more_base_comments().await.unwrap(), 1);
        assert!(!fx.presenter.has_more());
        assert_eq!(fx.presenter.load_more_base_comments().await.unwrap(), 0);
        assert_eq!(fx.presenter.base_comments().len(), 5);
    }

    #[tokio::test]
    async fn replies_are_fetched_on_first_expansion_only() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "nice ollie", None).await;
        let thanks = seed(&fx, "thanks", Some(base.id)).await;
        seed(&fx, "np", Some(thanks.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();

        assert!(fx.presenter.toggle_expanded(base.id).await.unwrap());
        assert_eq!(
            contents(&fx.presenter.snapshot()),
            vec![
                ("nice ollie".to_owned(), 0),
                ("thanks".to_owned(), 1),
                ("np".to_owned(), 2),
            ]
        );

        assert!(!fx.presenter.toggle_expanded(base.id).await.unwrap());
        assert_eq!(fx.presenter.snapshot().len(), 1);

        // Written behind the presenter's back; a cached thread does not see it.
        seed(&fx, "late", Some(base.id)).await;
        assert!(fx.presenter.toggle_expanded(base.id).await.unwrap());
        assert_eq!(fx.presenter.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn submitted_comment_replaces_its_placeholder() {
        let fx = fixture(CommentConfig::default()).await;

        let stored = fx.presenter.submit_comment("first try").await.unwrap();
        let rows = fx.presenter.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].comment, stored);
        assert!(!rows[0].pending);
        assert_eq!(stored.owner_user_id, fx.viewer);
    }

    #[tokio::test]
    async fn failed_submissions_are_rolled_back() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "base", None).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();
        let before = fx.presenter.snapshot();

        fx.store.faults().set_store_down(true);
        assert!(fx.presenter.submit_comment("lost").await.is_err());
        assert!(fx.presenter.submit_reply(base.id, "lost").await.is_err());
        fx.store.faults().set_store_down(false);

        assert_eq!(fx.presenter.snapshot(), before);
        assert_eq!(fx.presenter.base_comments()[0].reply_count, 0);
    }

    #[tokio::test]
    async fn submitted_replies_are_relinearized() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "base", None).await;
        let a = seed(&fx, "a", Some(base.id)).await;
        seed(&fx, "b", Some(base.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();

        fx.presenter.submit_reply(a.id, "a1").await.unwrap();

        assert_eq!(
            contents(&fx.presenter.snapshot()),
            vec![
                ("base".to_owned(), 0),
                ("a".to_owned(), 1),
                ("a1".to_owned(), 2),
                ("b".to_owned(), 1),
            ]
        );
        assert_eq!(fx.presenter.base_comments()[0].reply_count, 3);
    }

    #[tokio::test]
    async fn deleting_a_reply_hides_orphans_under_keep_policy() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "nice ollie", None).await;
        let thanks = seed(&fx, "thanks", Some(base.id)).await;
        seed(&fx, "np", Some(thanks.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();

        let outcome = fx.presenter.delete_node(thanks.id).await.unwrap();
        assert_eq!(outcome.removed, vec![thanks.id]);

        assert_eq!(contents(&fx.presenter.snapshot()), vec![("nice ollie".to_owned(), 0)]);
        assert_eq!(fx.presenter.base_comments()[0].reply_count, 1);
    }

    #[tokio::test]
    async fn deleting_a_reply_drops_its_subtree_under_cascade_policy() {
        let config = CommentConfig::default().with_orphan_policy(OrphanPolicy::Cascade);
        let fx = fixture(config).await;
        let base = seed(&fx, "base", None).await;
        let a = seed(&fx, "a", Some(base.id)).await;
        seed(&fx, "a1", Some(a.id)).await;
        seed(&fx, "b", Some(base.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();

        fx.presenter.delete_node(a.id).await.unwrap();

        assert_eq!(
            contents(&fx.presenter.snapshot()),
            vec![("base".to_owned(), 0), ("b".to_owned(), 1)]
        );
        assert_eq!(fx.presenter.base_comments()[0].reply_count, 1);
    }

    #[tokio::test]
    async fn deleting_a_base_clears_its_thread() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "base", None).await;
        seed(&fx, "reply", Some(base.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();

        fx.presenter.delete_node(base.id).await.unwrap();

        assert!(fx.presenter.snapshot().is_empty());
        assert!(!fx.presenter.is_expanded(base.id));
        assert!(fx.presenter.replies(base.id).is_none());
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn interrupted_cascade_prunes_what_was_removed() {
        let config = CommentConfig::default().with_orphan_policy(OrphanPolicy::Cascade);
        let fx = fixture(config).await;
        let base = seed(&fx, "base", None).await;
        let a = seed(&fx, "a", Some(base.id)).await;
        let a1 = seed(&fx, "a1", Some(a.id)).await;
        seed(&fx, "a2", Some(a1.id)).await;
        fx.presenter.load_more_base_comments().await.unwrap();
        fx.presenter.toggle_expanded(base.id).await.unwrap();

        // Leaves go first, so only "a2" is removed before the store fails.
        fx.store.faults().fail_deletes_after(1);
        assert!(fx.presenter.delete_node(a.id).await.is_err());
        fx.store.faults().reset();

        assert_eq!(
            contents(&fx.presenter.snapshot()),
            vec![
                ("base".to_owned(), 0),
                ("a".to_owned(), 1),
                ("a1".to_owned(), 2),
            ]
        );
        assert_eq!(fx.presenter.base_comments()[0].reply_count, 2);
    }

    #[tokio::test]
    async fn paging_and_expanding_run_concurrently() {
        let fx = fixture(CommentConfig::default()).await;
        let base = seed(&fx, "base", None).await;
        seed(&fx, "reply", Some(base.id)).await;
        seed(&fx, "second", None).await;

        let (loaded, expanded) = tokio::join!(
            fx.presenter.load_more_base_comments(),
            fx.presenter.toggle_expanded(base.id),
        );
        assert_eq!(loaded.unwrap(), 2);
        assert!(expanded.unwrap());
        assert_eq!(fx.presenter.snapshot().len(), 3);
    }
}
