use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::model::Notification;
use crate::{Error, NotificationDispatcher, Result};

/// A dispatcher that records what it was asked to send.
#[derive(Debug, Clone)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
    /// Number of `send` calls that returned.
    attempts: Arc<watch::Sender<usize>>,
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self {
            sent: Arc::default(),
            failing: Arc::default(),
            hanging: Arc::default(),
            attempts: Arc::new(watch::channel(0).0),
        }
    }
}

impl RecordingDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends never complete.
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    /// Waits until `count` sends have returned, successfully or not.
    pub async fn settled(&self, count: usize) {
        let mut attempts = self.attempts.subscribe();
        let _ = attempts.wait_for(|done| *done >= count).await;
    }

    /// Makes subsequent sends fail without recording.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns the notifications sent so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, notification: Notification) -> Result<()> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let result = if self.failing.load(Ordering::SeqCst) {
            Err(Error::store_unavailable().with_message("push gateway unreachable"))
        } else {
            self.sent.lock().await.push(notification);
            Ok(())
        };

        self.attempts.send_modify(|done| *done += 1);
        result
    }
}
