use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A base comment or a reply, as stored.
///
/// Base comments have no parent and are their own thread root
/// (`base_id == id`). Replies point at the comment they answer through
/// `parent_id` and at the root of their thread through `base_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Post the comment belongs to.
    pub post_id: Uuid,
    /// Root of the thread; equal to `id` for a base comment.
    pub base_id: Uuid,
    /// Node directly being replied to.
    pub parent_id: Option<Uuid>,
    /// Author of the comment.
    pub owner_user_id: Uuid,
    /// Comment text.
    pub content: String,
    /// Username of the immediate parent's owner at upload time.
    pub reply_to_username: Option<String>,
    /// Write time, assigned by the store.
    pub created_at: Timestamp,
    /// Number of descendants; maintained on base comments only.
    pub reply_count: i64,
}

impl Comment {
    /// Returns whether the comment answers another node.
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Returns whether the comment is the root of its thread.
    #[inline]
    pub fn is_base(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns the `(created_at, id)` sort key used by pagination.
    #[inline]
    pub fn sort_key(&self) -> (Timestamp, Uuid) {
        (self.created_at, self.id)
    }
}

/// Insert payload for [`CommentStore::insert`].
///
/// [`CommentStore::insert`]: crate::CommentStore::insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: Uuid,
    pub owner_user_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    /// `None` makes the stored node its own base.
    pub base_id: Option<Uuid>,
    pub reply_to_username: Option<String>,
}

impl NewComment {
    /// Creates the payload of a base comment.
    pub fn base(post_id: Uuid, owner_user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            post_id,
            owner_user_id,
            content: content.into(),
            parent_id: None,
            base_id: None,
            reply_to_username: None,
        }
    }

    /// Creates the payload of a reply to `parent`.
    pub fn reply(parent: &Comment, owner_user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            post_id: parent.post_id,
            owner_user_id,
            content: content.into(),
            parent_id: Some(parent.id),
            base_id: Some(parent.base_id),
            reply_to_username: None,
        }
    }

    /// Sets the denormalized username of the replied-to author.
    pub fn with_reply_to_username(mut self, username: impl Into<String>) -> Self {
        self.reply_to_username = Some(username.into());
        self
    }
}

/// A user's request to post a comment or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadComment {
    pub post_id: Uuid,
    pub owner_user_id: Uuid,
    pub content: String,
    /// Set when replying to an existing comment or reply.
    pub parent_id: Option<Uuid>,
}

impl UploadComment {
    /// Creates a base-comment upload.
    pub fn comment(post_id: Uuid, owner_user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            post_id,
            owner_user_id,
            content: content.into(),
            parent_id: None,
        }
    }

    /// Creates a reply upload.
    pub fn reply(
        post_id: Uuid,
        owner_user_id: Uuid,
        parent_id: Uuid,
        content: impl Into<String>,
    ) -> Self {
        Self {
            post_id,
            owner_user_id,
            content: content.into(),
            parent_id: Some(parent_id),
        }
    }
}
