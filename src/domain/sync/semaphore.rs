use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

/// A bounded counting semaphore.
///
/// `acquire` blocks until a permit is available. `release` hands a permit
/// back and wakes one waiter; releasing past `max_permits` fails, the same
/// way a `V()` on a bounded OS semaphore does.
#[derive(Debug)]
pub struct Semaphore {
    name: String,
    permits: Mutex<usize>,
    max_permits: usize,
    available: Condvar,
}

impl Semaphore {
    pub fn new(name: impl Into<String>, initial: usize, max_permits: usize) -> Self {
        Self { name: name.into(), permits: Mutex::new(initial.min(max_permits)), max_permits, available: Condvar::new() }
    }

    /// A count-of-one handoff signal that starts empty.
    pub fn signal(name: impl Into<String>) -> Self {
        Self::new(name, 0, 1)
    }

    /// A one-slot mutual-exclusion gate that starts open.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, 1, 1)
    }

    pub fn acquire(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self.available.wait(permits).unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut permits = self.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    pub fn release(&self) -> Result<()> {
        let mut permits = self.lock();
        if *permits >= self.max_permits {
            return Err(Error::SignalFailed(format!("{} (already at {} permits)", self.name, self.max_permits)));
        }
        *permits += 1;
        self.available.notify_one();
        Ok(())
    }

    pub fn available_permits(&self) -> usize {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
