use serde::{Deserialize, Serialize};

/// Keyset pagination query: `?limit=&cursor=`.
///
/// Both fields are optional. The page size falls back to the configured
/// default and is clamped by the comment service; an unusable cursor
/// restarts from the first page.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CursorPaginationRequest {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl CursorPaginationRequest {
    #[inline]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[inline]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Returns the cursor, treating an empty string as absent.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}
