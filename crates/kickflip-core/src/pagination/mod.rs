//! Keyset pagination over comment queries.
//!
//! Cursors wrap the sort key `(created_at, id)` of the last returned record
//! and are bound to the query shape that minted them, so a base-comment cursor
//! is never accepted by a reply query and vice versa.

mod cursor;

pub use cursor::{Cursor, CursorPage, CursorPagination, CursorScope, MAX_LIMIT};
