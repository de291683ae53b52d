use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::UserSummary;
use crate::{Result, UserDirectory};

/// A user directory backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<Uuid, UserSummary>>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns their id.
    pub async fn register(&self, username: impl Into<String>) -> Uuid {
        let user = UserSummary::new(Uuid::now_v7(), username);
        let id = user.id;
        self.users.write().await.insert(id, user);
        id
    }

    /// Removes a user, as an account deletion would.
    pub async fn forget(&self, user_id: Uuid) {
        self.users.write().await.remove(&user_id);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserSummary>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}
