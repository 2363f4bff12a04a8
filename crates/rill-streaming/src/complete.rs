//! One-shot completion signal.

use std::sync::{Arc, Mutex, PoisonError};

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct CompletionState {
    complete: bool,
    callbacks: Vec<Callback>,
}

/// A one-shot promise-like completion signal.
///
/// [`complete`](Self::complete) transitions at most once; callbacks
/// registered after completion fire immediately. The deferred body uses one
/// of these to mark finalization, which is how "finalize happens at most
/// once" is guaranteed structurally rather than by convention.
#[derive(Clone, Default)]
pub struct Completion {
    state: Arc<Mutex<CompletionState>>,
}

impl Completion {
    /// Create an incomplete signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the signal has completed.
    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    /// Complete the signal, firing all registered callbacks.
    ///
    /// Returns true if this call performed the transition; subsequent calls
    /// are no-ops and return false.
    pub fn complete(&self) -> bool {
        let callbacks = {
            let mut state = self.lock();
            if state.complete {
                return false;
            }
            state.complete = true;
            std::mem::take(&mut state.callbacks)
        };
        // Run outside the lock; a callback may register more callbacks.
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Register a callback to run on completion.
    ///
    /// If the signal is already complete the callback runs immediately on
    /// the caller's stack.
    pub fn on_complete(&self, callback: impl FnOnce() + Send + 'static) {
        let run_now = {
            let mut state = self.lock();
            if state.complete {
                true
            } else {
                state.callbacks.push(Box::new(callback));
                return;
            }
        };
        if run_now {
            callback();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CompletionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_complete_fires_callbacks_once() {
        let completion = Completion::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        completion.on_complete(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!completion.is_complete());
        assert!(completion.complete());
        assert!(completion.is_complete());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_complete_is_noop() {
        let completion = Completion::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        completion.on_complete(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(completion.complete());
        assert!(!completion.complete());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_registration_fires_immediately() {
        let completion = Completion::new();
        completion.complete();

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        completion.on_complete(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_callbacks_all_fire() {
        let completion = Completion::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let c = count.clone();
            completion.on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }

        completion.complete();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_callback_registering_callback_does_not_deadlock() {
        let completion = Completion::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner = completion.clone();
        let c = count.clone();
        completion.on_complete(move || {
            inner.on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        completion.complete();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
