//! In-memory busy flag with scoped reset

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a busy flag set until dropped
///
/// The flag is reset on every exit path, including errors and panics unwinding
/// through the holder.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Set `flag`, or return `None` if it is already set
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
