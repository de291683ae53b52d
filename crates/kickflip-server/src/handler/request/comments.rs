//! Comment request types.

use kickflip_core::model::UploadComment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /posts/{postId}/comments`.
///
/// A `parentId` turns the upload into a reply to that comment or reply.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl UploadCommentRequest {
    pub fn into_upload(self, post_id: Uuid, owner_user_id: Uuid) -> UploadComment {
        UploadComment {
            post_id,
            owner_user_id,
            content: self.content,
            parent_id: self.parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_fails_validation() {
        let request = UploadCommentRequest {
            content: String::new(),
            parent_id: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn parent_id_is_optional() -> anyhow::Result<()> {
        let request: UploadCommentRequest = serde_json::from_str(r#"{"content":"sick line"}"#)?;
        assert!(request.validate().is_ok());
        assert_eq!(request.parent_id, None);

        let post_id = Uuid::now_v7();
        let owner = Uuid::now_v7();
        let upload = request.into_upload(post_id, owner);
        assert_eq!(upload.post_id, post_id);
        assert_eq!(upload.owner_user_id, owner);
        Ok(())
    }
}
