use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when a user cannot be resolved.
pub const DELETED_USER_NAME: &str = "deleted user";

/// Identity of a commenter, as resolved through the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

impl UserSummary {
    /// Creates a new user summary.
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// Placeholder for a user that no longer resolves.
    pub fn deleted(id: Uuid) -> Self {
        Self::new(id, DELETED_USER_NAME)
    }

    /// Returns whether this is the deleted-user placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.username == DELETED_USER_NAME
    }
}
