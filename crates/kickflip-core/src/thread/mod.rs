//! Reconstruction of display order for a reply tree stored as flat records.

mod order;

pub use order::{OrderedThread, ThreadEntry, ThreadNode, order_thread};
