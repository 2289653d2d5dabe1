//! Outbound frame id allocation

use std::sync::atomic::{AtomicU32, Ordering};

/// Monotonically increasing frame id allocator, starting at 1
///
/// Explicitly constructed and injected rather than kept as process-global
/// state so tests can run with a fresh counter. Wraps at `u32::MAX`
/// (`fetch_add` semantics); a session never comes close to four billion
/// commands.
pub struct FrameIdAllocator {
    next: AtomicU32,
}

impl FrameIdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Return the next id and advance the counter
    pub fn next(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for FrameIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
