//! Upload and read paths of the comment service.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::model::{Comment, NewComment, Notification, NotificationKind, PostSummary, UploadComment};
use crate::pagination::{CursorPage, CursorPagination, CursorScope};
use crate::thread::{OrderedThread, order_thread};
use crate::{
    CommentConfig, CommentStore, CounterService, CounterTarget, Error, NoopDispatcher,
    NotificationDispatcher, PostStore, Result, TRACING_TARGET_SERVICE, TRACING_TARGET_THREAD,
    UserDirectory, resolve_user,
};

/// Orchestrates comment storage, counters and notifications.
///
/// Every dependency is injected, and clones share them.
#[derive(Clone)]
pub struct CommentService {
    pub(super) store: Arc<dyn CommentStore>,
    pub(super) counters: Arc<dyn CounterService>,
    pub(super) posts: Option<Arc<dyn PostStore>>,
    pub(super) users: Option<Arc<dyn UserDirectory>>,
    pub(super) dispatcher: Arc<dyn NotificationDispatcher>,
    pub(super) config: CommentConfig,
}

impl fmt::Debug for CommentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentService")
            .field("has_post_store", &self.posts.is_some())
            .field("has_user_directory", &self.users.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CommentService {
    /// Creates a service over a comment store and a counter service.
    pub fn new(store: Arc<dyn CommentStore>, counters: Arc<dyn CounterService>) -> Self {
        Self {
            store,
            counters,
            posts: None,
            users: None,
            dispatcher: Arc::new(NoopDispatcher),
            config: CommentConfig::default(),
        }
    }

    /// Creates a service whose comments, counters and posts share one backend.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: CommentStore + CounterService + PostStore + Clone + 'static,
    {
        Self::new(Arc::new(backend.clone()), Arc::new(backend.clone()))
            .with_post_store(Arc::new(backend))
    }

    /// Sets the post store used to validate posts and address notifications.
    pub fn with_post_store(mut self, posts: Arc<dyn PostStore>) -> Self {
        self.posts = Some(posts);
        self
    }

    /// Sets the user directory used to denormalize reply targets.
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    /// Sets the notification dispatcher.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Sets the comment configuration.
    pub fn with_config(mut self, config: CommentConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the comment configuration.
    pub fn config(&self) -> &CommentConfig {
        &self.config
    }

    /// Creates a base comment or a reply.
    ///
    /// The insert and the two counter updates are not atomic as a unit. A
    /// counter failure after the insert is logged and the upload still
    /// succeeds. The notification is sent in the background, so a slow
    /// dispatcher never delays the response.
    #[tracing::instrument(
        skip_all,
        fields(
            post_id = %request.post_id,
            parent_id = ?request.parent_id,
        )
    )]
    pub async fn upload(&self, request: UploadComment) -> Result<Comment> {
        let content = self.validate_content(&request.content)?;
        let post = self.find_post(request.post_id).await?;

        let (new_comment, parent) = match request.parent_id {
            None => (
                NewComment::base(request.post_id, request.owner_user_id, content),
                None,
            ),
            Some(parent_id) => {
                let parent = self.store.get(parent_id).await?.ok_or_else(|| {
                    Error::not_found().with_message(format!("parent comment {parent_id}"))
                })?;

                if parent.post_id != request.post_id {
                    return Err(Error::invalid_input()
                        .with_message("parent comment belongs to a different post"));
                }

                let mut reply = NewComment::reply(&parent, request.owner_user_id, content);
                if let Some(users) = &self.users {
                    let target = resolve_user(users.as_ref(), parent.owner_user_id).await;
                    reply = reply.with_reply_to_username(target.username);
                }

                (reply, Some(parent))
            }
        };

        let comment = self.store.insert(new_comment).await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            comment_id = %comment.id,
            base_id = %comment.base_id,
            is_reply = comment.is_reply(),
            "Comment created",
        );

        if comment.is_reply() {
            self.adjust(CounterTarget::ReplyCount(comment.base_id), 1).await;
        }
        self.adjust(CounterTarget::PostCommentCount(comment.post_id), 1)
            .await;

        self.notify(&comment, post.as_ref(), parent.as_ref());

        Ok(comment)
    }

    /// Point lookup of a comment or reply.
    #[tracing::instrument(skip_all, fields(comment_id = %comment_id))]
    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        self.store.get(comment_id).await
    }

    /// One page of a post's base comments, oldest first.
    ///
    /// An unusable cursor restarts from the first page.
    #[tracing::instrument(skip_all, fields(post_id = %post_id))]
    pub async fn get_thread_page(
        &self,
        post_id: Uuid,
        page_size: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<CursorPage<Comment>> {
        let pagination = CursorPagination::from_cursor_string(
            CursorScope::Base,
            self.config.page_size(page_size),
            cursor,
        );

        let page = self.store.query_base_comments(post_id, pagination).await?;

        tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            count = page.items.len(),
            has_more = page.has_more(),
            "Base comments fetched",
        );

        Ok(page)
    }

    /// Every reply of a thread, in display order.
    #[tracing::instrument(skip_all, fields(base_id = %base_id))]
    pub async fn get_replies(&self, base_id: Uuid) -> Result<OrderedThread<Comment>> {
        let replies = self.store.query_all_replies(base_id).await?;
        let thread = order_thread(base_id, replies, self.config.max_thread_depth);

        if thread.has_orphans() {
            tracing::warn!(
                target: TRACING_TARGET_THREAD,
                orphaned = thread.orphaned.len(),
                "Thread contains replies unreachable from its base comment",
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            count = thread.len(),
            "Replies fetched",
        );

        Ok(thread)
    }

    /// One page of a thread's replies, newest first and unordered by tree.
    #[tracing::instrument(skip_all, fields(base_id = %base_id))]
    pub async fn get_replies_page(
        &self,
        base_id: Uuid,
        page_size: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<CursorPage<Comment>> {
        let pagination = CursorPagination::from_cursor_string(
            CursorScope::Reply,
            self.config.page_size(page_size),
            cursor,
        );

        self.store.query_replies(base_id, base_id, pagination).await
    }

    fn validate_content(&self, content: &str) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::invalid_input().with_message("comment must not be empty"));
        }

        let max = self.config.max_content_length;
        if content.chars().count() > max {
            return Err(Error::invalid_input()
                .with_message(format!("comment must be at most {max} characters")));
        }

        Ok(content.to_owned())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        let Some(posts) = &self.posts else {
            return Ok(None);
        };

        let post = posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found().with_message(format!("post {post_id}")))?;

        Ok(Some(post))
    }

    /// Applies a counter delta, logging instead of failing.
    ///
    /// Returns `false` when the counter could not be updated.
    pub(super) async fn adjust(&self, target: CounterTarget, delta: i64) -> bool {
        if delta == 0 {
            return true;
        }

        match target.apply(self.counters.as_ref(), delta).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_SERVICE,
                    counter = %target,
                    delta,
                    error = %err,
                    "Counter update failed, counts will drift until reconciled",
                );
                false
            }
        }
    }

    /// Hands the notification to a background task; delivery never holds up
    /// the upload that caused it.
    fn notify(&self, comment: &Comment, post: Option<&PostSummary>, parent: Option<&Comment>) {
        let (to_user_id, kind) = match parent {
            Some(parent) => (parent.owner_user_id, NotificationKind::Reply),
            None => match post {
                Some(post) => (post.owner_user_id, NotificationKind::Comment),
                None => return,
            },
        };

        if to_user_id == comment.owner_user_id {
            return;
        }

        let notification = Notification {
            to_user_id,
            kind,
            post_id: comment.post_id,
            comment_id: comment.id,
            base_id: comment.base_id,
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            if let Err(err) = dispatcher.send(notification).await {
                tracing::warn!(
                    target: TRACING_TARGET_SERVICE,
                    to_user_id = %to_user_id,
                    error = %err,
                    "Notification dispatch failed",
                );
            }
        });
    }
}
