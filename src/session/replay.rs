use std::collections::HashSet;
use std::sync::Mutex;

/// Store of already-consumed session nonces.
///
/// Injectable so a single instance can use the in-process guard below while a
/// multi-instance deployment backs it with a shared store.
pub trait ReplayStore: Send + Sync {
    /// Membership check used during step-2 validation.
    fn has_consumed(&self, nonce: &str) -> bool;

    /// Records a nonce as consumed. Returns `false` if it was already present.
    /// Check and insert happen in a single critical section.
    fn mark_consumed(&self, nonce: &str) -> bool;
}

/// Bounded in-process replay guard.
///
/// Once the set reaches the configured ceiling it is cleared entirely, trading
/// exact one-time-use under sustained load for bounded memory. The ceiling is a
/// deployment tunable (`REPLAY_GUARD_MAX_ENTRIES`).
pub struct InMemoryReplayGuard {
    max_entries: usize,
    consumed: Mutex<HashSet<String>>,
}

impl InMemoryReplayGuard {
    /// Creates a guard that clears itself when `max_entries` is reached.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            consumed: Mutex::new(HashSet::new()),
        }
    }

    /// Number of nonces currently tracked.
    pub fn len(&self) -> usize {
        self.consumed
            .lock()
            .expect("replay guard lock poisoned")
            .len()
    }

    /// Returns `true` if no nonces are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayStore for InMemoryReplayGuard {
    fn has_consumed(&self, nonce: &str) -> bool {
        self.consumed
            .lock()
            .expect("replay guard lock poisoned")
            .contains(nonce)
    }

    fn mark_consumed(&self, nonce: &str) -> bool {
        let mut consumed = self.consumed.lock().expect("replay guard lock poisoned");
        if consumed.len() >= self.max_entries {
            tracing::warn!(
                entries = consumed.len(),
                "Replay guard ceiling reached, clearing consumed-nonce set"
            );
            consumed.clear();
        }
        consumed.insert(nonce.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_consumed_nonces() {
        let guard = InMemoryReplayGuard::new(16);
        assert!(!guard.has_consumed("a"));
        assert!(guard.mark_consumed("a"));
        assert!(guard.has_consumed("a"));
    }

    #[test]
    fn marking_twice_reports_already_present() {
        let guard = InMemoryReplayGuard::new(16);
        assert!(guard.mark_consumed("a"));
        assert!(!guard.mark_consumed("a"));
    }

    #[test]
    fn clears_entirely_at_the_ceiling() {
        let guard = InMemoryReplayGuard::new(3);
        for nonce in ["a", "b", "c"] {
            guard.mark_consumed(nonce);
        }
        assert_eq!(guard.len(), 3);

        // The next insert hits the ceiling: earlier nonces are forgotten.
        guard.mark_consumed("d");
        assert_eq!(guard.len(), 1);
        assert!(!guard.has_consumed("a"));
        assert!(guard.has_consumed("d"));
    }
}
