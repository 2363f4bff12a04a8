//! Event-loop scheduling abstraction.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A scheduled unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// The "next tick" primitive the streaming core is built on.
///
/// Every observable effect of the deferred body - chunk delivery, the
/// finalize check after a close - happens inside a task handed to a
/// `Schedule` implementation, never inline on the caller's stack. That is
/// what keeps producer and consumer activity re-entrancy safe on a
/// cooperative event loop.
pub trait Schedule: Send + Sync {
    /// Schedule `task` to run on a future loop turn.
    fn schedule(&self, task: Task);
}

/// Shared handle to a scheduler.
pub type SharedScheduler = Arc<dyn Schedule>;

/// Production scheduler backed by a tokio runtime handle.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Create a scheduler for the given runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Create a scheduler for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, same as
    /// [`tokio::runtime::Handle::current`].
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Schedule for TokioScheduler {
    fn schedule(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }
}

/// Deterministic FIFO scheduler driven by hand.
///
/// Tasks only run when the owner calls [`run_next`](Self::run_next) or
/// [`run_all`](Self::run_all), in the exact order they were scheduled. This
/// is the scheduler to use in tests and in host integrations that want to
/// drain the loop at explicit points.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the oldest pending task. Returns false if none was pending.
    pub fn run_next(&self) -> bool {
        let task = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks scheduled while
    /// draining. Returns how many tasks ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Schedule for ManualScheduler {
    fn schedule(&self, task: Task) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
