//! In-memory implementations of every storage and collaborator seam.
//!
//! The backends are cheap to clone (clones share state) and carry a
//! [`FaultPlan`] so tests can simulate store outages, counter failures and
//! cascades that break off halfway.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! kickflip-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use kickflip_core::mock::{MemoryDirectory, MemoryStore};
//! use kickflip_core::service::CommentService;
//!
//! let store = MemoryStore::new();
//! let service = CommentService::from_backend(store.clone())
//!     .with_user_directory(Arc::new(MemoryDirectory::new()));
//! ```

mod directory;
mod dispatcher;
mod fault;
mod store;

pub use directory::MemoryDirectory;
pub use dispatcher::RecordingDispatcher;
pub use fault::FaultPlan;
pub use store::MemoryStore;
