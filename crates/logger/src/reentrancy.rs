//! Per-thread marker for "a record is being written right now".
//!
//! Sinks may emit `tracing` diagnostics while holding their own lock. If the
//! tracing bridge forwarded those events back into the same sinks the thread
//! would try to take that lock again, so the bridges drop any event raised
//! while the marker is set.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as dispatching until dropped.
#[must_use = "the thread is only marked while the guard is alive"]
pub struct DispatchGuard {
    previous: bool,
    // Tied to the thread that created it.
    _not_send: PhantomData<*const ()>,
}

impl DispatchGuard {
    /// Set the marker for the current thread.
    pub fn enter() -> Self {
        let previous = DISPATCHING.with(|flag| flag.replace(true));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(self.previous));
    }
}

/// Whether the current thread is inside a [`DispatchGuard`].
#[must_use]
pub fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}
