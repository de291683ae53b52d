//! Client-side aggregation of a post's comment threads.
//!
//! [`ThreadPresenter`] caches base comments, replies per thread and the set
//! of expanded threads, and turns them into display rows. Writes are applied
//! optimistically and rolled back when the service call fails.

mod state;
mod thread_presenter;

pub use thread_presenter::{ThreadPresenter, ThreadRow};
