//! Comment service: uploads, reads, deletes and counter reconciliation.

mod comment_service;
mod deletion;
mod reconcile;

#[cfg(test)]
mod tests;

pub use comment_service::CommentService;
pub use deletion::{DeleteOutcome, DeletionJob, JobStatus};
pub use reconcile::Reconciliation;
