//! Request and order id allocation.
//!
//! Ids come from a single monotonically increasing sequence. The gateway supplies the first
//! valid id; nothing may be allocated before then.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::Error;

// Marks an allocator the gateway has not seeded yet.
const UNSEEDED: i32 = i32::MIN;

/// Thread-safe allocator for request ids.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next_id: AtomicI32,
}

impl RequestIdAllocator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(UNSEEDED),
        }
    }

    /// An allocator whose first id is `start`.
    pub fn seeded(start: i32) -> Self {
        Self {
            next_id: AtomicI32::new(start),
        }
    }

    /// Returns a fresh id, or [Error::Sequencing] before the allocator is seeded.
    pub fn next(&self) -> Result<i32, Error> {
        let mut current = self.next_id.load(Ordering::SeqCst);
        loop {
            if current == UNSEEDED {
                return Err(Error::Sequencing("no valid id received from the gateway yet".into()));
            }
            match self.next_id.compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(id) => return Ok(id),
                Err(actual) => current = actual,
            }
        }
    }

    /// Accepts a next valid id from the gateway. The sequence never moves backwards.
    pub fn seed(&self, id: i32) {
        self.next_id.fetch_max(id, Ordering::SeqCst);
    }

    /// The id the next call to [RequestIdAllocator::next] would return, if seeded.
    pub fn current(&self) -> Option<i32> {
        match self.next_id.load(Ordering::SeqCst) {
            UNSEEDED => None,
            id => Some(id),
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.current().is_some()
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
