//! Wire shapes of comment pages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Comment;
use crate::pagination::CursorPage;
use crate::thread::ThreadEntry;

/// Serialized form of a [`Comment`].
///
/// `createdAt` is carried as milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub base_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub owner_user_id: Uuid,
    pub content: String,
    pub created_at: i64,
    pub reply_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_username: Option<String>,
}

impl From<Comment> for CommentRecord {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            base_id: comment.base_id,
            parent_id: comment.parent_id,
            owner_user_id: comment.owner_user_id,
            content: comment.content,
            created_at: comment.created_at.as_millisecond(),
            reply_count: comment.reply_count,
            reply_to_username: comment.reply_to_username,
        }
    }
}

/// One page of items plus the token to request the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T, U> From<CursorPage<U>> for Page<T>
where
    T: From<U>,
{
    fn from(page: CursorPage<U>) -> Self {
        Self {
            items: page.items.into_iter().map(T::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

/// A reply in display order, with its nesting depth below the base comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadReply {
    #[serde(flatten)]
    pub record: CommentRecord,
    /// 1 for a direct reply to the base comment.
    pub depth: usize,
}

impl From<ThreadEntry<Comment>> for ThreadReply {
    fn from(entry: ThreadEntry<Comment>) -> Self {
        Self {
            record: entry.node.into(),
            depth: entry.depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;

    #[test]
    fn record_uses_camel_case_and_millis() {
        let id = Uuid::now_v7();
        let comment = Comment {
            id,
            post_id: id,
            base_id: id,
            parent_id: None,
            owner_user_id: id,
            content: "nice ollie".into(),
            reply_to_username: None,
            created_at: Timestamp::from_millisecond(1_700_000_000_123).unwrap(),
            reply_count: 2,
        };

        let value = serde_json::to_value(CommentRecord::from(comment)).unwrap();
        assert_eq!(value["createdAt"], json!(1_700_000_000_123_i64));
        assert_eq!(value["replyCount"], json!(2));
        assert_eq!(value["parentId"], json!(null));
        assert!(value.get("replyToUsername").is_none());
    }

    #[test]
    fn empty_page_serializes_null_cursor() {
        let page: Page<CommentRecord> = Page {
            items: vec![],
            next_cursor: None,
        };
        let value = serde_json::to_value(page).unwrap();
        assert_eq!(value, json!({ "items": [], "nextCursor": null }));
    }
}
