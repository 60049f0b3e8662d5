//! Bounded fetch concurrency.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Caller-owned pool of fetch slots.
///
/// Clones share the same slots, so one pool can bound every search running
/// in a process. A slot is released when its `FetchPermit` is dropped.
#[derive(Debug, Clone)]
pub struct FetchPermits {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held fetch slot.
#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}

impl FetchPermits {
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<FetchPermit, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        Ok(FetchPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
