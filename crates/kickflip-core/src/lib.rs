#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for comment service operations.
///
/// Use this target for uploads, deletions, cascades and counter bookkeeping.
pub const TRACING_TARGET_SERVICE: &str = "kickflip_core::service";

/// Tracing target for counter reconciliation passes.
pub const TRACING_TARGET_RECONCILE: &str = "kickflip_core::reconcile";

/// Tracing target for pagination cursor handling.
pub const TRACING_TARGET_PAGINATION: &str = "kickflip_core::pagination";

/// Tracing target for thread reconstruction.
pub const TRACING_TARGET_THREAD: &str = "kickflip_core::thread";

/// Tracing target for the client-side thread presenter.
pub const TRACING_TARGET_PRESENTER: &str = "kickflip_core::presenter";

mod collaborator;
mod config;
mod error;
mod store;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod model;
pub mod pagination;
pub mod presenter;
pub mod service;
pub mod thread;

pub use crate::collaborator::{
    NoopDispatcher, NotificationDispatcher, PostStore, UserDirectory, resolve_user,
};
pub use crate::config::{CommentConfig, OrphanPolicy};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::store::{CommentStore, CounterService, CounterTarget};
