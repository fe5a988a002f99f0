//! Global admission control for in-flight requests.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{Error, Result};

/// Bounds the number of simultaneous in-flight requests.
///
/// Waiters are admitted in FIFO order. Without a capacity every acquisition
/// succeeds immediately.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: Option<NonZeroUsize>,
}

/// A reserved slot, released when dropped.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate; `None` means unbounded.
    #[must_use]
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        let permits = capacity.map_or(Semaphore::MAX_PERMITS, NonZeroUsize::get);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            capacity,
        }
    }

    /// Wait for a free slot and reserve it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GateClosed`] once [`ConcurrencyGate::close`] was called.
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| Error::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// Fail pending and future acquisitions; held permits stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Returns `true` once the gate was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    /// Number of slots currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let permits = self
            .capacity
            .map_or(Semaphore::MAX_PERMITS, NonZeroUsize::get);
        permits.saturating_sub(self.semaphore.available_permits())
    }
}
