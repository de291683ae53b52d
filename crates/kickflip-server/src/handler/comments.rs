//! Comment and reply handlers.
//!
//! Thin adapters over [`CommentService`]: they extract ids, the acting user
//! and pagination, call one service operation and shape the answer into
//! the wire records of `kickflip_core::model`.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use kickflip_core::service::{CommentService, Reconciliation};

use crate::extract::{Actor, Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CommentPathParams, CursorPaginationRequest, PostPathParams, UploadCommentRequest,
};
use crate::handler::response::{CommentRecord, Page, ThreadReply};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for comment operations.
const TRACING_TARGET: &str = "kickflip_server::handler::comments";

/// Lists a page of a post's base comments, oldest first.
#[tracing::instrument(skip_all, fields(post_id = %path_params.post_id))]
async fn list_post_comments(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<PostPathParams>,
    Query(pagination): Query<CursorPaginationRequest>,
) -> Result<(StatusCode, Json<Page<CommentRecord>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing base comments");

    let page = comment_service
        .get_thread_page(path_params.post_id, pagination.limit, pagination.cursor())
        .await?;

    tracing::debug!(
        target: TRACING_TARGET,
        count = page.items.len(),
        has_more = page.next_cursor.is_some(),
        "Base comments listed",
    );

    Ok((StatusCode::OK, Json(page.into())))
}

/// Uploads a base comment, or a reply when `parentId` is set.
#[tracing::instrument(skip_all, fields(post_id = %path_params.post_id, user_id = %actor.user_id))]
async fn upload_comment(
    State(comment_service): State<CommentService>,
    actor: Actor,
    Path(path_params): Path<PostPathParams>,
    ValidateJson(request): ValidateJson<UploadCommentRequest>,
) -> Result<(StatusCode, Json<CommentRecord>)> {
    tracing::debug!(
        target: TRACING_TARGET,
        parent_id = ?request.parent_id,
        "Uploading comment",
    );

    let upload = request.into_upload(path_params.post_id, actor.user_id);
    let comment = comment_service.upload(upload).await?;

    tracing::info!(
        target: TRACING_TARGET,
        comment_id = %comment.id,
        base_id = %comment.base_id,
        "Comment uploaded",
    );

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Returns a single comment or reply.
#[tracing::instrument(skip_all, fields(comment_id = %path_params.comment_id))]
async fn get_comment(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<CommentPathParams>,
) -> Result<(StatusCode, Json<CommentRecord>)> {
    let Some(comment) = comment_service.get_comment(path_params.comment_id).await? else {
        return Err(ErrorKind::NotFound
            .with_message(format!("Comment not found: {}", path_params.comment_id))
            .with_resource("comment"));
    };

    Ok((StatusCode::OK, Json(comment.into())))
}

/// Returns every reply of a thread in display order, with depths.
#[tracing::instrument(skip_all, fields(base_id = %path_params.comment_id))]
async fn list_thread_replies(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<CommentPathParams>,
) -> Result<(StatusCode, Json<Vec<ThreadReply>>)> {
    let thread = comment_service.get_replies(path_params.comment_id).await?;

    let replies = thread
        .entries
        .into_iter()
        .map(ThreadReply::from)
        .collect::<Vec<_>>();

    tracing::debug!(
        target: TRACING_TARGET,
        count = replies.len(),
        orphaned = thread.orphaned.len(),
        "Thread replies listed",
    );

    Ok((StatusCode::OK, Json(replies)))
}

/// Lists a page of a thread's replies, newest first.
#[tracing::instrument(skip_all, fields(base_id = %path_params.comment_id))]
async fn list_thread_replies_page(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<CommentPathParams>,
    Query(pagination): Query<CursorPaginationRequest>,
) -> Result<(StatusCode, Json<Page<CommentRecord>>)> {
    let page = comment_service
        .get_replies_page(path_params.comment_id, pagination.limit, pagination.cursor())
        .await?;

    Ok((StatusCode::OK, Json(page.into())))
}

/// Deletes a base comment with its thread, or a single reply.
///
/// Only the author may delete a node. Answers 204 whether or not the node
/// still existed.
#[tracing::instrument(skip_all, fields(comment_id = %path_params.comment_id, user_id = %actor.user_id))]
async fn delete_comment(
    State(comment_service): State<CommentService>,
    actor: Actor,
    Path(path_params): Path<CommentPathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting comment");

    if let Some(comment) = comment_service.get_comment(path_params.comment_id).await?
        && comment.owner_user_id != actor.user_id
    {
        tracing::warn!(
            target: TRACING_TARGET,
            owner_user_id = %comment.owner_user_id,
            "Delete refused, acting user is not the author",
        );
        return Err(ErrorKind::Forbidden
            .with_resource("comment")
            .with_message("only the author may delete this comment"));
    }

    let outcome = comment_service.delete(path_params.comment_id).await?;

    if !outcome.counters_consistent() {
        tracing::warn!(
            target: TRACING_TARGET,
            drifted = outcome.counter_failures.len(),
            "Comment deleted with drifted counters",
        );
    }

    tracing::info!(
        target: TRACING_TARGET,
        removed = outcome.removed.len(),
        "Comment delete finished",
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Recomputes a base comment's reply count.
///
/// Run it while the thread is quiet: an upload racing the recount can be
/// counted twice. A later recount on the quiet thread undoes that.
#[tracing::instrument(skip_all, fields(base_id = %path_params.comment_id))]
async fn reconcile_thread(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<CommentPathParams>,
) -> Result<(StatusCode, Json<Reconciliation>)> {
    let reconciliation = comment_service
        .reconcile_thread(path_params.comment_id)
        .await?;

    Ok((StatusCode::OK, Json(reconciliation)))
}

/// Recomputes a post's comment count.
///
/// Like [`reconcile_thread`], meant for a post without writes in flight.
#[tracing::instrument(skip_all, fields(post_id = %path_params.post_id))]
async fn reconcile_post(
    State(comment_service): State<CommentService>,
    Path(path_params): Path<PostPathParams>,
) -> Result<(StatusCode, Json<Reconciliation>)> {
    let reconciliation = comment_service
        .reconcile_post(path_params.post_id)
        .await?;

    Ok((StatusCode::OK, Json(reconciliation)))
}

/// Returns a [`Router`] with all comment related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route(
            "/posts/{postId}/comments",
            get(list_post_comments).post(upload_comment),
        )
        .route("/posts/{postId}/reconcile", post(reconcile_post))
        .route(
            "/comments/{commentId}",
            get(get_comment).delete(delete_comment),
        )
        .route("/comments/{commentId}/replies", get(list_thread_replies))
        .route(
            "/comments/{commentId}/replies/page",
            get(list_thread_replies_page),
        )
        .route("/comments/{commentId}/reconcile", post(reconcile_thread))
}

#[cfg(test)]
mod test {
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use kickflip_core::mock::{MemoryDirectory, MemoryStore};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::extract::USER_ID_HEADER;
    use crate::handler::test::create_test_server_with_service;

    struct Harness {
        server: TestServer,
        store: MemoryStore,
        directory: MemoryDirectory,
        post_id: Uuid,
    }

    async fn harness() -> anyhow::Result<Harness> {
        let store = MemoryStore::new();
        let directory = MemoryDirectory::new();
        let comment_service = CommentService::from_backend(store.clone())
            .with_user_directory(std::sync::Arc::new(directory.clone()));

        let owner = directory.register("post-owner").await;
        let post_id = store.create_post(owner).await;
        let server = create_test_server_with_service(comment_service)?;

        Ok(Harness {
            server,
            store,
            directory,
            post_id,
        })
    }

    fn user_header(user_id: Uuid) -> anyhow::Result<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_static(USER_ID_HEADER);
        let value = HeaderValue::from_str(&user_id.to_string())?;
        Ok((name, value))
    }

    async fn upload(
        harness: &Harness,
        user_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> anyhow::Result<CommentRecord> {
        let (name, value) = user_header(user_id)?;
        let response = harness
            .server
            .post(&format!("/posts/{}/comments", harness.post_id))
            .add_header(name, value)
            .json(&json!({ "content": content, "parentId": parent_id }))
            .await;
        response.assert_status(StatusCode::CREATED);
        Ok(response.json())
    }

    #[tokio::test]
    async fn upload_and_fetch_comment() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("tony").await;

        let created = upload(&harness, author, "  clean kickflip  ", None).await?;
        assert_eq!(created.content, "clean kickflip");
        assert_eq!(created.base_id, created.id);
        assert_eq!(created.parent_id, None);

        let response = harness
            .server
            .get(&format!("/comments/{}", created.id))
            .await;
        response.assert_status_ok();
        let fetched: CommentRecord = response.json();
        assert_eq!(fetched, created);

        let post = harness.store.post(harness.post_id).await;
        assert_eq!(post.map(|post| post.comment_count), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn upload_requires_an_acting_user() -> anyhow::Result<()> {
        let harness = harness().await?;

        let response = harness
            .server
            .post(&format!("/posts/{}/comments", harness.post_id))
            .json(&json!({ "content": "no header" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        assert!(harness.store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn upload_rejects_empty_content() -> anyhow::Result<()> {
        let harness = harness().await?;
        let (name, value) = user_header(Uuid::now_v7())?;

        let response = harness
            .server
            .post(&format!("/posts/{}/comments", harness.post_id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "content": "" }))
            .await;
        response.assert_status_bad_request();

        let response = harness
            .server
            .post(&format!("/posts/{}/comments", harness.post_id))
            .add_header(name, value)
            .json(&json!({ "content": "   " }))
            .await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn upload_to_unknown_post_is_not_found() -> anyhow::Result<()> {
        let harness = harness().await?;
        let (name, value) = user_header(Uuid::now_v7())?;

        let response = harness
            .server
            .post(&format!("/posts/{}/comments", Uuid::now_v7()))
            .add_header(name, value)
            .json(&json!({ "content": "lost" }))
            .await;
        response.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn malformed_comment_id_is_bad_request() -> anyhow::Result<()> {
        let harness = harness().await?;

        let response = harness.server.get("/comments/not-a-uuid").await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn missing_comment_is_not_found() -> anyhow::Result<()> {
        let harness = harness().await?;

        let response = harness
            .server
            .get(&format!("/comments/{}", Uuid::now_v7()))
            .await;
        response.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn replies_are_ordered_with_depth() -> anyhow::Result<()> {
        let harness = harness().await?;
        let alice = harness.directory.register("alice").await;
        let bob = harness.directory.register("bob").await;

        let base = upload(&harness, alice, "first", None).await?;
        let reply = upload(&harness, bob, "reply", Some(base.id)).await?;
        let nested = upload(&harness, alice, "nested", Some(reply.id)).await?;

        assert_eq!(reply.reply_to_username.as_deref(), Some("alice"));
        assert_eq!(nested.reply_to_username.as_deref(), Some("bob"));
        assert_eq!(nested.base_id, base.id);

        let response = harness
            .server
            .get(&format!("/comments/{}/replies", base.id))
            .await;
        response.assert_status_ok();

        let replies: Vec<ThreadReply> = response.json();
        let order = replies
            .iter()
            .map(|reply| (reply.record.id, reply.depth))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(reply.id, 1), (nested.id, 2)]);

        let base = harness.store.comment(base.id).await;
        assert_eq!(base.map(|base| base.reply_count), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn base_comments_paginate_with_cursor() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("rodney").await;

        let mut created = Vec::new();
        for index in 0..3 {
            created.push(upload(&harness, author, &format!("trick {index}"), None).await?.id);
        }

        let path = format!("/posts/{}/comments", harness.post_id);
        let response = harness.server.get(&path).add_query_param("limit", 2).await;
        response.assert_status_ok();
        let first: Page<CommentRecord> = response.json();
        assert_eq!(first.items.len(), 2);

        let cursor = first.next_cursor.clone().ok_or_else(|| anyhow::anyhow!("no cursor"))?;
        let response = harness
            .server
            .get(&path)
            .add_query_param("limit", 2)
            .add_query_param("cursor", cursor)
            .await;
        response.assert_status_ok();
        let second: Page<CommentRecord> = response.json();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_cursor, None);

        let seen = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|record| record.id)
            .collect::<Vec<_>>();
        assert_eq!(seen, created);
        Ok(())
    }

    #[tokio::test]
    async fn reply_pages_are_newest_first() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("elissa").await;

        let base = upload(&harness, author, "base", None).await?;
        let older = upload(&harness, author, "older", Some(base.id)).await?;
        let newer = upload(&harness, author, "newer", Some(base.id)).await?;

        let response = harness
            .server
            .get(&format!("/comments/{}/replies/page", base.id))
            .await;
        response.assert_status_ok();

        let page: Page<CommentRecord> = response.json();
        let ids = page.items.iter().map(|record| record.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![newer.id, older.id]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("leticia").await;
        let (name, value) = user_header(author)?;

        let base = upload(&harness, author, "base", None).await?;
        upload(&harness, author, "reply", Some(base.id)).await?;

        for _ in 0..2 {
            let response = harness
                .server
                .delete(&format!("/comments/{}", base.id))
                .add_header(name.clone(), value.clone())
                .await;
            response.assert_status(StatusCode::NO_CONTENT);
        }

        assert!(harness.store.is_empty().await);
        let post = harness.store.post(harness.post_id).await;
        assert_eq!(post.map(|post| post.comment_count), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn only_the_author_may_delete() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("elissa").await;
        let stranger = harness.directory.register("stranger").await;

        let base = upload(&harness, author, "my line", None).await?;

        let (name, value) = user_header(stranger)?;
        let response = harness
            .server
            .delete(&format!("/comments/{}", base.id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert!(harness.store.comment(base.id).await.is_some());

        let (name, value) = user_header(author)?;
        let response = harness
            .server
            .delete(&format!("/comments/{}", base.id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(harness.store.comment(base.id).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_is_service_unavailable() -> anyhow::Result<()> {
        let harness = harness().await?;
        harness.store.faults().set_store_down(true);

        let response = harness
            .server
            .get(&format!("/comments/{}", Uuid::now_v7()))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    #[tokio::test]
    async fn reconcile_repairs_reply_count() -> anyhow::Result<()> {
        let harness = harness().await?;
        let author = harness.directory.register("nyjah").await;

        let base = upload(&harness, author, "base", None).await?;
        harness.store.faults().set_counters_down(true);
        upload(&harness, author, "uncounted", Some(base.id)).await?;
        harness.store.faults().set_counters_down(false);

        let response = harness
            .server
            .post(&format!("/comments/{}/reconcile", base.id))
            .await;
        response.assert_status_ok();

        let reconciliation: Reconciliation = response.json();
        assert_eq!(reconciliation.expected, 1);
        assert_eq!(reconciliation.observed, 0);
        assert_eq!(reconciliation.applied_delta, 1);

        let response = harness
            .server
            .post(&format!("/posts/{}/reconcile", harness.post_id))
            .await;
        response.assert_status_ok();
        let reconciliation: Reconciliation = response.json();
        assert_eq!(reconciliation.expected, 2);
        assert_eq!(reconciliation.applied_delta, 1);
        Ok(())
    }
}
