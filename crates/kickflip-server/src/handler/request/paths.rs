//! Path parameter types for HTTP handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPathParams {
    pub post_id: Uuid,
}

#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPathParams {
    pub comment_id: Uuid,
}
