//! Response types for HTTP handlers.
//!
//! Comment payloads reuse the wire records of `kickflip_core::model`.

mod errors;
mod monitors;

pub use errors::ErrorResponse;
pub use kickflip_core::model::{CommentRecord, Page, ThreadReply};
pub use kickflip_core::service::Reconciliation;
pub use monitors::{MonitorStatus, ServiceStatus};
