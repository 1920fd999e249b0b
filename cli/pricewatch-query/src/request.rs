use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of an issued request, see [RequestTracker].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestId(u64);

/// Tracks which request of a controller is the latest one.
///
/// A response may only be applied while its request is current:
/// issuing a new request or disposing the controller makes every
/// earlier request stale.
#[derive(Debug, Default)]
pub(crate) struct RequestTracker {
    generation: u64,
    disposed: bool,
}

impl RequestTracker {
    pub(crate) fn issue(&mut self) -> RequestId {
        self.generation = self.generation.saturating_add(1);
        RequestId(self.generation)
    }

    /// Make any in-flight request stale without issuing a new one.
    pub(crate) fn invalidate(&mut self) {
        self.issue();
    }

    pub(crate) fn is_current(&self, id: RequestId) -> bool {
        !self.disposed && self.generation == id.0
    }

    pub(crate) fn dispose(&mut self) {
        self.disposed = true;
        self.invalidate();
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Lock `mutex`, recovering the data if a previous holder panicked.
///
/// Controller state is only ever replaced wholesale under the lock,
/// so a poisoned guard still holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_request_is_current() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));

        tracker.invalidate();
        assert!(!tracker.is_current(second));
    }

    #[test]
    fn nothing_is_current_after_dispose() {
        let mut tracker = RequestTracker::default();
        tracker.dispose();
        let late = tracker.issue();
        assert!(!tracker.is_current(late));
        assert!(tracker.is_disposed());
    }
}
