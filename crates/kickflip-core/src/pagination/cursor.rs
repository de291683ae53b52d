//! Cursor-based pagination for comment queries.
//!
//! Cursor pagination provides stable incremental fetching: resumption is by key
//! comparison on `(created_at, id)`, so a cursor stays usable after the record
//! it points at has been deleted.

use std::cmp::Ordering;

use base64::prelude::*;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, TRACING_TARGET_PAGINATION};

/// Maximum number of items per page.
pub const MAX_LIMIT: i64 = 100;

/// The query shape a cursor was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CursorScope {
    /// Base comments of a post, oldest first.
    Base,
    /// Replies of a thread, newest first.
    Reply,
}

impl CursorScope {
    /// Returns whether queries of this scope walk the key space ascending.
    pub fn is_ascending(self) -> bool {
        matches!(self, Self::Base)
    }
}

/// A cursor representing a position in a paginated result set.
///
/// The cursor encodes the last seen item's timestamp and ID. The ID serves as
/// a tiebreaker for items with identical timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cursor {
    /// Query shape this cursor belongs to.
    pub scope: CursorScope,
    /// Timestamp of the last seen item.
    pub timestamp: Timestamp,
    /// ID of the last seen item (tiebreaker).
    pub id: Uuid,
}

impl Cursor {
    /// Creates a new cursor from a timestamp and ID.
    pub fn new(scope: CursorScope, timestamp: Timestamp, id: Uuid) -> Self {
        Self {
            scope,
            timestamp,
            id,
        }
    }

    /// Encodes the cursor as a URL-safe base64 string.
    pub fn encode(&self) -> String {
        let data = format!("{}|{}|{}", self.scope.as_ref(), self.timestamp, self.id);
        BASE64_URL_SAFE_NO_PAD.encode(data.as_bytes())
    }

    /// Decodes a cursor from a URL-safe base64 string.
    pub fn decode(encoded: &str) -> Result<Self> {
        let malformed = || Error::invalid_cursor().with_message("malformed pagination token");

        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|err| malformed().with_source(err))?;
        let data = String::from_utf8(bytes).map_err(|err| malformed().with_source(err))?;

        let mut parts = data.splitn(3, '|');
        let (Some(scope), Some(timestamp), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let scope = scope.parse().map_err(|_| malformed())?;
        let timestamp = timestamp
            .parse()
            .map_err(|err| malformed().with_source(err))?;
        let id = id.parse().map_err(|err| malformed().with_source(err))?;

        Ok(Self {
            scope,
            timestamp,
            id,
        })
    }

    /// Decodes a cursor and checks that it was minted for `scope`.
    pub fn decode_for(scope: CursorScope, encoded: &str) -> Result<Self> {
        let cursor = Self::decode(encoded)?;
        if cursor.scope != scope {
            return Err(Error::invalid_cursor().with_message(format!(
                "cursor was issued for {} queries, not {}",
                cursor.scope.as_ref(),
                scope.as_ref()
            )));
        }

        Ok(cursor)
    }

    /// Returns whether a record with the given key comes strictly after this
    /// cursor in the scope's traversal direction.
    pub fn precedes(&self, timestamp: Timestamp, id: Uuid) -> bool {
        let ordering = (timestamp, id).cmp(&(self.timestamp, self.id));
        match self.scope.is_ascending() {
            true => ordering == Ordering::Greater,
            false => ordering == Ordering::Less,
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.encode()
    }
}

impl TryFrom<String> for Cursor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cursor::decode(&value)
    }
}

/// Cursor-based pagination parameters for comment queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPagination {
    /// Query shape the page belongs to.
    pub scope: CursorScope,
    /// Maximum number of records to return.
    pub limit: i64,
    /// Cursor pointing to the last item of the previous page.
    pub after: Option<Cursor>,
}

impl CursorPagination {
    /// Creates a first-page pagination with the given limit.
    pub fn new(scope: CursorScope, limit: i64) -> Self {
        Self {
            scope,
            limit: limit.clamp(1, MAX_LIMIT),
            after: None,
        }
    }

    /// Creates cursor pagination starting after the given cursor.
    pub fn after(limit: i64, cursor: Cursor) -> Self {
        Self {
            scope: cursor.scope,
            limit: limit.clamp(1, MAX_LIMIT),
            after: Some(cursor),
        }
    }

    /// Creates cursor pagination from an optional encoded cursor string.
    ///
    /// If the cursor string is malformed or belongs to another query shape,
    /// pagination starts from the beginning.
    pub fn from_cursor_string(scope: CursorScope, limit: i64, cursor: Option<&str>) -> Self {
        let after = cursor.and_then(|encoded| match Cursor::decode_for(scope, encoded) {
            Ok(cursor) => Some(cursor),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_PAGINATION,
                    error = %err,
                    scope = scope.as_ref(),
                    "Ignoring invalid cursor, restarting from the first page"
                );
                None
            }
        });

        Self {
            scope,
            limit: limit.clamp(1, MAX_LIMIT),
            after,
        }
    }

    /// Checks if we have a cursor to paginate from.
    pub fn has_cursor(&self) -> bool {
        self.after.is_some()
    }

    /// Returns whether a record with the given key belongs after the cursor.
    ///
    /// Always true on the first page.
    pub fn admits(&self, timestamp: Timestamp, id: Uuid) -> bool {
        self.after
            .as_ref()
            .is_none_or(|cursor| cursor.precedes(timestamp, id))
    }

    /// Returns the limit as a `usize`.
    pub fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(1)
    }
}

/// Result of a cursor-paginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPage<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Cursor to fetch the next page. Present only when the page is full.
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    /// Creates a new cursor page from query results.
    ///
    /// # Arguments
    /// * `items` - Items fetched from the store, at most `pagination.limit`
    /// * `pagination` - The pagination the items were fetched with
    /// * `cursor_fn` - Function to extract cursor data (timestamp, id) from an item
    pub fn new<F>(items: Vec<T>, pagination: &CursorPagination, cursor_fn: F) -> Self
    where
        F: Fn(&T) -> (Timestamp, Uuid),
    {
        let is_full = !items.is_empty() && items.len() as i64 >= pagination.limit;

        let next_cursor = if is_full {
            items.last().map(|item| {
                let (timestamp, id) = cursor_fn(item);
                Cursor::new(pagination.scope, timestamp, id).encode()
            })
        } else {
            None
        };

        Self { items, next_cursor }
    }

    /// Creates an empty cursor page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Returns true if there may be more items to fetch.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> CursorPage<U>
    where
        F: FnMut(T) -> U,
    {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn cursor(scope: CursorScope, second: i64) -> Cursor {
        let timestamp = Timestamp::from_second(second).unwrap();
        Cursor::new(scope, timestamp, Uuid::now_v7())
    }

    #[test]
    fn cursor_encode_decode_roundtrip() {
        let original = cursor(CursorScope::Reply, 1_700_000_000);
        let decoded = Cursor::decode(&original.encode()).expect("decode should succeed");
        assert_eq!(original, decoded);
    }

    #[test]
    fn cursor_decode_invalid() {
        for token in ["invalid", "", "not:valid:cursor", "%%%"] {
            let err = Cursor::decode(token).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidCursor);
        }
    }

    #[test]
    fn cursor_scopes_are_not_interchangeable() {
        let base = cursor(CursorScope::Base, 10).encode();
        let err = Cursor::decode_for(CursorScope::Reply, &base).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCursor);

        let pagination = CursorPagination::from_cursor_string(CursorScope::Reply, 10, Some(&base));
        assert!(!pagination.has_cursor());
    }

    #[test]
    fn invalid_cursor_string_restarts() {
        let pagination =
            CursorPagination::from_cursor_string(CursorScope::Base, 10, Some("garbage"));
        assert!(!pagination.has_cursor());
        assert_eq!(pagination.limit, 10);
    }

    #[test]
    fn cursor_pagination_limit_bounds() {
        assert_eq!(CursorPagination::new(CursorScope::Base, 0).limit, 1);
        assert_eq!(CursorPagination::new(CursorScope::Base, 200).limit, MAX_LIMIT);
        assert_eq!(CursorPagination::new(CursorScope::Base, -4).limit_usize(), 1);
    }

    #[test]
    fn ascending_cursor_admits_later_keys() {
        let after = cursor(CursorScope::Base, 100);
        let pagination = CursorPagination::after(10, after.clone());

        let later = Timestamp::from_second(101).unwrap();
        let earlier = Timestamp::from_second(99).unwrap();
        assert!(pagination.admits(later, Uuid::nil()));
        assert!(!pagination.admits(earlier, Uuid::max()));
        assert!(!pagination.admits(after.timestamp, after.id));
    }

    #[test]
    fn descending_cursor_admits_earlier_keys() {
        let after = cursor(CursorScope::Reply, 100);
        let pagination = CursorPagination::after(10, after.clone());

        let later = Timestamp::from_second(101).unwrap();
        let earlier = Timestamp::from_second(99).unwrap();
        assert!(pagination.admits(earlier, Uuid::max()));
        assert!(!pagination.admits(later, Uuid::nil()));
    }

    #[test]
    fn cursor_page_full_has_next() {
        let pagination = CursorPagination::new(CursorScope::Base, 3);
        let page = CursorPage::new(vec![1, 2, 3], &pagination, |_| {
            (Timestamp::UNIX_EPOCH, Uuid::nil())
        });

        assert!(page.has_more());
        let next = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(next.scope, CursorScope::Base);
    }

    #[test]
    fn cursor_page_short_is_exhausted() {
        let pagination = CursorPagination::new(CursorScope::Base, 3);
        let page = CursorPage::new(vec![1, 2], &pagination, |_| {
            (Timestamp::UNIX_EPOCH, Uuid::nil())
        });
        assert!(!page.has_more());

        let page: CursorPage<i32> = CursorPage::new(vec![], &pagination, |_| {
            (Timestamp::UNIX_EPOCH, Uuid::nil())
        });
        assert!(!page.has_more());
    }
}
