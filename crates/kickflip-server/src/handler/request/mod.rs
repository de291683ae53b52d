//! Request types for HTTP handlers.

mod comments;
mod pagination;
mod paths;

pub use comments::UploadCommentRequest;
pub use pagination::CursorPaginationRequest;
pub use paths::{CommentPathParams, PostPathParams};
