use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The part of a post the comment subsystem reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    /// Base comments plus replies of the post.
    pub comment_count: i64,
}
