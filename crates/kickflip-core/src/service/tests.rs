use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use super::*;
use crate::mock::{MemoryDirectory, MemoryStore, RecordingDispatcher};
use crate::model::{NewComment, NotificationKind, UploadComment};
use crate::{CommentConfig, CommentStore, CounterService, CounterTarget, ErrorKind, OrphanPolicy};

struct Fixture {
    store: MemoryStore,
    users: MemoryDirectory,
    dispatcher: RecordingDispatcher,
    service: CommentService,
    post_id: Uuid,
    owner: Uuid,
    alice: Uuid,
    bob: Uuid,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_config(CommentConfig::default()).await
    }

    async fn with_config(config: CommentConfig) -> Self {
        let store = MemoryStore::new();
        let users = MemoryDirectory::new();
        let dispatcher = RecordingDispatcher::new();

        let owner = users.register("owner").await;
        let alice = users.register("alice").await;
        let bob = users.register("bob").await;
        let post_id = store.create_post(owner).await;

        let service = CommentService::from_backend(store.clone())
            .with_user_directory(Arc::new(users.clone()))
            .with_dispatcher(Arc::new(dispatcher.clone()))
            .with_config(config);

        Self {
            store,
            users,
            dispatcher,
            service,
            post_id,
            owner,
            alice,
            bob,
        }
    }

    async fn comment(&self, author: Uuid, content: &str) -> crate::model::Comment {
        let request = UploadComment::comment(self.post_id, author, content);
        self.service.upload(request).await.unwrap()
    }

    async fn reply(&self, author: Uuid, parent_id: Uuid, content: &str) -> crate::model::Comment {
        let request = UploadComment::reply(self.post_id, author, parent_id, content);
        self.service.upload(request).await.unwrap()
    }

    async fn post_count(&self) -> i64 {
        self.store.post(self.post_id).await.unwrap().comment_count
    }

    async fn reply_count(&self, base_id: Uuid) -> i64 {
        self.store.comment(base_id).await.unwrap().reply_count
    }

    async fn live_nodes(&self) -> i64 {
        self.store.count_post_nodes(self.post_id).await.unwrap()
    }
}

#[tokio::test]
async fn scenario_comment_reply_and_orphaned_grandchild() {
    let fx = Fixture::new().await;

    let base = fx.comment(fx.alice, "nice ollie").await;
    assert_eq!(fx.post_count().await, 1);

    let thanks = fx.reply(fx.bob, base.id, "thanks").await;
    assert_eq!(thanks.base_id, base.id);
    assert_eq!(thanks.reply_to_username.as_deref(), Some("alice"));
    assert_eq!(fx.reply_count(base.id).await, 1);
    assert_eq!(fx.post_count().await, 2);

    let np = fx.reply(fx.alice, thanks.id, "np").await;
    assert_eq!(np.base_id, base.id);
    assert_eq!(np.parent_id, Some(thanks.id));
    assert_eq!(np.reply_to_username.as_deref(), Some("bob"));
    assert_eq!(fx.reply_count(base.id).await, 2);
    assert_eq!(fx.post_count().await, 3);

    let thread = fx.service.get_replies(base.id).await.unwrap();
    let contents: Vec<&str> = thread.nodes().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["thanks", "np"]);

    let outcome = fx.service.delete(thanks.id).await.unwrap();
    assert_eq!(outcome.removed, vec![thanks.id]);
    assert_eq!(fx.reply_count(base.id).await, 1);
    assert_eq!(fx.post_count().await, 2);

    let thread = fx.service.get_replies(base.id).await.unwrap();
    assert!(thread.is_empty());
    assert_eq!(thread.orphaned, vec![np.id]);
    assert!(fx.store.comment(np.id).await.is_some());
}

#[tokio::test]
async fn post_count_matches_live_nodes_after_mixed_operations() {
    let fx = Fixture::new().await;

    let first = fx.comment(fx.alice, "first").await;
    let second = fx.comment(fx.bob, "second").await;
    let r1 = fx.reply(fx.bob, first.id, "r1").await;
    let r2 = fx.reply(fx.alice, r1.id, "r2").await;
    let _r3 = fx.reply(fx.alice, second.id, "r3").await;
    let _r4 = fx.reply(fx.bob, r2.id, "r4").await;

    fx.service.delete(r1.id).await.unwrap();
    assert_eq!(fx.post_count().await, fx.live_nodes().await);

    fx.service.delete(first.id).await.unwrap();
    assert_eq!(fx.post_count().await, fx.live_nodes().await);

    let third = fx.comment(fx.alice, "third").await;
    fx.reply(fx.bob, third.id, "r5").await;
    fx.service.delete(second.id).await.unwrap();

    assert_eq!(fx.post_count().await, fx.live_nodes().await);
    assert_eq!(fx.post_count().await, 2);
}

#[tokio::test]
async fn paging_through_base_comments_is_complete_and_ordered() {
    let fx = Fixture::new().await;

    let mut inserted = Vec::new();
    for n in 0..23 {
        let comment = fx.comment(fx.alice, &format!("comment {n}")).await;
        inserted.push(comment.id);
        // Replies must never show up in base pages.
        fx.reply(fx.bob, comment.id, "reply").await;
    }

    let mut fetched = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fx
            .service
            .get_thread_page(fx.post_id, Some(5), cursor.as_deref())
            .await
            .unwrap();
        fetched.extend(page.items.iter().map(|c| c.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let distinct: HashSet<Uuid> = fetched.iter().copied().collect();
    assert_eq!(distinct.len(), fetched.len());
    assert_eq!(fetched, inserted);
}

#[tokio::test]
async fn cursor_survives_deletion_of_its_record() {
    let fx = Fixture::new().await;

    let mut inserted = Vec::new();
    for n in 0..6 {
        inserted.push(fx.comment(fx.alice, &format!("c{n}")).await.id);
    }

    let page = fx
        .service
        .get_thread_page(fx.post_id, Some(3), None)
        .await
        .unwrap();
    let anchor = page.items.last().unwrap().id;
    fx.service.delete(anchor).await.unwrap();

    let next = fx
        .service
        .get_thread_page(fx.post_id, Some(3), page.next_cursor.as_deref())
        .await
        .unwrap();
    let ids: Vec<Uuid> = next.items.iter().map(|c| c.id).collect();
    assert_eq!(ids, inserted[3..].to_vec());
}

#[tokio::test]
async fn malformed_cursor_restarts_from_first_page() {
    let fx = Fixture::new().await;
    let first = fx.comment(fx.alice, "first").await;
    fx.comment(fx.alice, "second").await;

    let page = fx
        .service
        .get_thread_page(fx.post_id, Some(1), Some("not-a-cursor"))
        .await
        .unwrap();
    assert_eq!(page.items[0].id, first.id);
}

#[tokio::test]
async fn reply_pages_are_newest_first_and_reject_base_cursors() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;

    let mut replies = Vec::new();
    for n in 0..4 {
        replies.push(fx.reply(fx.bob, base.id, &format!("r{n}")).await.id);
    }
    replies.reverse();

    let first = fx
        .service
        .get_replies_page(base.id, Some(2), None)
        .await
        .unwrap();
    let second = fx
        .service
        .get_replies_page(base.id, Some(2), first.next_cursor.as_deref())
        .await
        .unwrap();

    let ids: Vec<Uuid> = first.items.iter().chain(&second.items).map(|c| c.id).collect();
    assert_eq!(ids, replies);

    let base_page = fx
        .service
        .get_thread_page(fx.post_id, Some(1), None)
        .await
        .unwrap();
    let restarted = fx
        .service
        .get_replies_page(base.id, Some(2), base_page.next_cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(restarted.items, first.items);
}

#[tokio::test]
async fn deleting_a_base_removes_its_whole_thread() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    let other = fx.comment(fx.bob, "other").await;

    let a = fx.reply(fx.bob, base.id, "a").await;
    let b = fx.reply(fx.alice, a.id, "b").await;
    fx.reply(fx.bob, b.id, "c").await;
    fx.reply(fx.alice, base.id, "d").await;
    fx.reply(fx.bob, a.id, "e").await;
    assert_eq!(fx.reply_count(base.id).await, 5);
    let before = fx.post_count().await;

    let outcome = fx.service.delete(base.id).await.unwrap();
    assert_eq!(outcome.removed.len(), 6);
    assert_eq!(outcome.removed.last(), Some(&base.id));
    assert!(outcome.counters_consistent());

    assert_eq!(fx.post_count().await, before - 6);
    assert_eq!(fx.store.len().await, 1);
    assert!(fx.store.comment(other.id).await.is_some());
}

#[tokio::test]
async fn reply_count_tracks_uploads_and_deletes() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;

    let first = fx.reply(fx.bob, base.id, "one").await;
    fx.reply(fx.bob, base.id, "two").await;
    fx.reply(fx.bob, base.id, "three").await;
    fx.service.delete(first.id).await.unwrap();

    assert_eq!(fx.reply_count(base.id).await, 2);
}

#[tokio::test]
async fn deleting_twice_succeeds() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;

    assert!(!fx.service.delete(base.id).await.unwrap().is_noop());
    let again = fx.service.delete(base.id).await.unwrap();
    assert!(again.is_noop());
    assert_eq!(fx.post_count().await, 0);

    assert!(fx.service.delete(Uuid::now_v7()).await.unwrap().is_noop());
}

#[tokio::test]
async fn cascade_policy_removes_reply_subtree() {
    let config = CommentConfig::default().with_orphan_policy(OrphanPolicy::Cascade);
    let fx = Fixture::with_config(config).await;

    let base = fx.comment(fx.alice, "nice ollie").await;
    let thanks = fx.reply(fx.bob, base.id, "thanks").await;
    let np = fx.reply(fx.alice, thanks.id, "np").await;
    let sibling = fx.reply(fx.owner, base.id, "sick").await;

    let outcome = fx.service.delete(thanks.id).await.unwrap();
    assert_eq!(outcome.removed, vec![np.id, thanks.id]);
    assert_eq!(fx.reply_count(base.id).await, 1);
    assert_eq!(fx.post_count().await, 2);

    let thread = fx.service.get_replies(base.id).await.unwrap();
    assert_eq!(thread.into_nodes().iter().map(|c| c.id).collect::<Vec<_>>(), vec![sibling.id]);
}

#[tokio::test]
async fn interrupted_cascade_only_decrements_what_was_removed() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    for n in 0..4 {
        fx.reply(fx.bob, base.id, &format!("r{n}")).await;
    }
    assert_eq!(fx.post_count().await, 5);

    fx.store.faults().fail_deletes_after(2);
    let err = fx.service.delete(base.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    fx.store.faults().reset();

    assert_eq!(fx.post_count().await, 3);
    assert_eq!(fx.reply_count(base.id).await, 2);
    assert_eq!(fx.post_count().await, fx.live_nodes().await);

    let reconciled = fx.service.reconcile_thread(base.id).await.unwrap();
    assert!(reconciled.was_consistent());
}

#[tokio::test]
async fn counter_failures_do_not_fail_uploads_and_are_reconciled() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;

    fx.store.faults().set_counters_down(true);
    let reply = fx.reply(fx.bob, base.id, "drifted").await;
    assert!(fx.store.comment(reply.id).await.is_some());
    fx.store.faults().set_counters_down(false);

    assert_eq!(fx.reply_count(base.id).await, 0);
    assert_eq!(fx.post_count().await, 1);

    let thread = fx.service.reconcile_thread(base.id).await.unwrap();
    assert_eq!(thread.target, CounterTarget::ReplyCount(base.id));
    assert_eq!((thread.expected, thread.observed, thread.applied_delta), (1, 0, 1));
    assert_eq!(fx.reply_count(base.id).await, 1);

    let post = fx.service.reconcile_post(fx.post_id).await.unwrap();
    assert_eq!((post.expected, post.observed, post.applied_delta), (2, 1, 1));
    assert_eq!(fx.post_count().await, 2);

    assert!(fx.service.reconcile_post(fx.post_id).await.unwrap().was_consistent());
}

#[tokio::test]
async fn counter_failures_during_delete_are_reported() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    let reply = fx.reply(fx.bob, base.id, "reply").await;

    fx.store.faults().set_counters_down(true);
    let outcome = fx.service.delete(reply.id).await.unwrap();
    assert_eq!(outcome.removed, vec![reply.id]);
    assert_eq!(
        outcome.counter_failures,
        vec![
            CounterTarget::ReplyCount(base.id),
            CounterTarget::PostCommentCount(fx.post_id),
        ]
    );
}

#[tokio::test]
async fn reconciling_a_reply_is_rejected() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    let reply = fx.reply(fx.bob, base.id, "reply").await;

    let err = fx.service.reconcile_thread(reply.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = fx.service.reconcile_thread(Uuid::now_v7()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn store_outage_aborts_upload_with_retryable_error() {
    let fx = Fixture::new().await;
    fx.store.faults().set_store_down(true);

    let request = UploadComment::comment(fx.post_id, fx.alice, "hello");
    let err = fx.service.upload(request).await.unwrap_err();
    assert!(err.is_retryable());

    fx.store.faults().set_store_down(false);
    assert_eq!(fx.post_count().await, 0);
}

#[tokio::test]
async fn upload_validates_input() {
    let fx = Fixture::new().await;

    let blank = UploadComment::comment(fx.post_id, fx.alice, "   ");
    assert_eq!(
        fx.service.upload(blank).await.unwrap_err().kind(),
        ErrorKind::InvalidInput
    );

    let long = UploadComment::comment(fx.post_id, fx.alice, "x".repeat(1001));
    assert_eq!(
        fx.service.upload(long).await.unwrap_err().kind(),
        ErrorKind::InvalidInput
    );

    let trimmed = fx.comment(fx.alice, "  kickflip  ").await;
    assert_eq!(trimmed.content, "kickflip");

    let orphan = UploadComment::reply(fx.post_id, fx.alice, Uuid::now_v7(), "hi");
    assert!(fx.service.upload(orphan).await.unwrap_err().is_not_found());

    let missing_post = UploadComment::comment(Uuid::now_v7(), fx.alice, "hi");
    assert!(fx.service.upload(missing_post).await.unwrap_err().is_not_found());

    let other_post = fx.store.create_post(fx.owner).await;
    let cross = UploadComment::reply(other_post, fx.alice, trimmed.id, "hi");
    assert_eq!(
        fx.service.upload(cross).await.unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[tokio::test]
async fn notifications_reach_post_and_parent_owners() {
    let fx = Fixture::new().await;

    let base = fx.comment(fx.alice, "nice ollie").await;
    let thanks = fx.reply(fx.bob, base.id, "thanks").await;
    // Replying to oneself notifies nobody.
    fx.reply(fx.bob, thanks.id, "also me").await;
    // Commenting on one's own post notifies nobody.
    fx.comment(fx.owner, "thanks all").await;

    fx.dispatcher.settled(2).await;
    let sent = fx.dispatcher.sent().await;
    assert_eq!(sent.len(), 2);

    let comment = sent.iter().find(|n| n.kind == NotificationKind::Comment).unwrap();
    assert_eq!(comment.to_user_id, fx.owner);
    assert_eq!(comment.comment_id, base.id);

    let reply = sent.iter().find(|n| n.kind == NotificationKind::Reply).unwrap();
    assert_eq!(reply.to_user_id, fx.alice);
    assert_eq!(reply.comment_id, thanks.id);
    assert_eq!(reply.base_id, base.id);
}

#[tokio::test]
async fn dispatcher_failures_do_not_block_uploads() {
    let fx = Fixture::new().await;
    fx.dispatcher.set_failing(true);

    fx.comment(fx.alice, "still posted").await;
    fx.dispatcher.settled(1).await;
    assert_eq!(fx.post_count().await, 1);
    assert!(fx.dispatcher.sent().await.is_empty());
}

#[tokio::test]
async fn hung_dispatcher_does_not_hold_up_uploads() {
    let fx = Fixture::new().await;
    fx.dispatcher.set_hanging(true);

    let request = UploadComment::comment(fx.post_id, fx.alice, "push gateway is down");
    let upload = tokio::time::timeout(std::time::Duration::from_secs(2), fx.service.upload(request));
    let comment = upload.await.expect("upload waited on the dispatcher").unwrap();

    assert_eq!(fx.store.comment(comment.id).await, Some(comment));
    assert_eq!(fx.post_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn counters_stay_consistent_under_concurrent_writes() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "line up for the rail").await;

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..200 {
        let service = fx.service.clone();
        let request = UploadComment::reply(fx.post_id, fx.bob, base.id, format!("try {n}"));
        tasks.spawn(async move {
            let reply = service.upload(request).await?;
            if n % 3 == 0 {
                service.delete(reply.id).await?;
            }
            Ok::<_, crate::Error>(())
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let live = fx.live_nodes().await;
    assert_eq!(live, 1 + 200 - 67);
    assert_eq!(fx.post_count().await, live);
    assert_eq!(fx.reply_count(base.id).await, live - 1);

    assert!(fx.service.reconcile_thread(base.id).await.unwrap().was_consistent());
    assert!(fx.service.reconcile_post(fx.post_id).await.unwrap().was_consistent());
}

#[tokio::test]
async fn reconcile_racing_an_upload_overshoots_until_rerun() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;

    // An upload whose insert is visible but whose increment is still in
    // flight when the recount runs.
    fx.store
        .insert(NewComment::reply(&base, fx.bob, "mid-flight"))
        .await
        .unwrap();
    let racing = fx.service.reconcile_thread(base.id).await.unwrap();
    assert_eq!(racing.applied_delta, 1);
    fx.store.increment_reply_count(base.id, 1).await.unwrap();
    assert_eq!(fx.reply_count(base.id).await, 2);

    let quiet = fx.service.reconcile_thread(base.id).await.unwrap();
    assert_eq!(quiet.applied_delta, -1);
    assert_eq!(fx.reply_count(base.id).await, 1);
}

#[tokio::test]
async fn unknown_parent_owner_degrades_to_placeholder() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    fx.users.forget(fx.alice).await;

    let reply = fx.reply(fx.bob, base.id, "who?").await;
    assert_eq!(
        reply.reply_to_username.as_deref(),
        Some(crate::model::DELETED_USER_NAME)
    );
}

#[tokio::test]
async fn deletion_jobs_report_completion() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    fx.reply(fx.bob, base.id, "reply").await;

    let job = fx.service.spawn_delete(base.id);
    assert_eq!(job.comment_id(), base.id);

    let outcome = job.wait().await.unwrap();
    assert_eq!(outcome.removed.len(), 2);
    assert_eq!(fx.post_count().await, 0);
}

#[tokio::test]
async fn deletion_jobs_report_failure() {
    let fx = Fixture::new().await;
    let base = fx.comment(fx.alice, "base").await;
    fx.store.faults().set_store_down(true);

    let job = fx.service.spawn_delete(base.id);
    let observer = job.clone();
    let err = job.wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(matches!(observer.status(), JobStatus::Failed { .. }));
}
