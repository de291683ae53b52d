use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{Error, Result};

/// Switchable failures shared by a [`MemoryStore`] and its clones.
///
/// [`MemoryStore`]: super::MemoryStore
#[derive(Debug)]
pub struct FaultPlan {
    store_down: AtomicBool,
    counters_down: AtomicBool,
    deletes_left: AtomicUsize,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            store_down: AtomicBool::new(false),
            counters_down: AtomicBool::new(false),
            deletes_left: AtomicUsize::new(usize::MAX),
        }
    }
}

impl FaultPlan {
    /// Makes every comment store call fail with `StoreUnavailable`.
    pub fn set_store_down(&self, down: bool) {
        self.store_down.store(down, Ordering::SeqCst);
    }

    /// Makes every counter update fail.
    pub fn set_counters_down(&self, down: bool) {
        self.counters_down.store(down, Ordering::SeqCst);
    }

    /// Lets `remaining` more deletes succeed, then fails the rest.
    pub fn fail_deletes_after(&self, remaining: usize) {
        self.deletes_left.store(remaining, Ordering::SeqCst);
    }

    /// Clears every fault.
    pub fn reset(&self) {
        self.set_store_down(false);
        self.set_counters_down(false);
        self.deletes_left.store(usize::MAX, Ordering::SeqCst);
    }

    pub(super) fn check_store(&self) -> Result<()> {
        if self.store_down.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable().with_message("memory store is down"));
        }
        Ok(())
    }

    pub(super) fn check_counters(&self) -> Result<()> {
        if self.counters_down.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable().with_message("counter backend is down"));
        }
        Ok(())
    }

    pub(super) fn check_delete(&self) -> Result<()> {
        self.check_store()?;

        let allowed = self
            .deletes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                left => Some(left - 1),
            })
            .is_ok();

        match allowed {
            true => Ok(()),
            false => Err(Error::store_unavailable().with_message("connection dropped mid-delete")),
        }
    }
}
