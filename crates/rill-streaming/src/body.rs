//! The deferred body: buffered chunks with an ordered close protocol.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rill_core::StreamError;

use crate::{Chunk, Completion, Schedule, SharedScheduler};

/// Phase of a deferred body's close protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepting chunks.
    Open,
    /// Closed to producers; pending chunks may still be draining.
    Closing,
    /// Finalized. Terminal.
    Finalized,
}

/// Callback receiving delivered chunks.
pub type Consumer = Box<dyn FnMut(Chunk) + Send>;

type CloseHook = Box<dyn FnOnce() + Send>;

struct BodyState {
    /// Pending chunk groups, front = oldest.
    queue: VecDeque<Vec<Chunk>>,
    /// The registered consumer. Taken out of the slot for the duration of a
    /// delivery pass so the consumer runs without the state lock held.
    consumer: Option<Consumer>,
    /// True once a consumer has ever been registered; the slot above being
    /// empty then only means a pass is mid-delivery.
    consumer_registered: bool,
    /// True while a delivery pass has the consumer checked out.
    delivering: bool,
    phase: Phase,
    before_close: Option<CloseHook>,
}

/// A single-producer/single-consumer chunk pipe with an explicit close
/// protocol.
///
/// Producers append chunks with [`chunk`](Self::chunk); the host server
/// registers one consumer with [`on_chunk`](Self::on_chunk) and observes
/// finalization through [`on_finalize`](Self::on_finalize). Delivery always
/// happens on scheduled tasks, one chunk group per loop turn, so a burst of
/// queued chunks never monopolizes the thread.
///
/// Handles are cheap clones sharing one body. The state sits behind a mutex
/// so producers on other threads can feed a body drained elsewhere; the
/// consumer itself is always invoked with the lock released.
#[derive(Clone)]
pub struct DeferredBody {
    state: Arc<Mutex<BodyState>>,
    scheduler: SharedScheduler,
    completion: Completion,
}

impl DeferredBody {
    /// Create an open body scheduling its work on `scheduler`.
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            state: Arc::new(Mutex::new(BodyState {
                queue: VecDeque::new(),
                consumer: None,
                consumer_registered: false,
                delivering: false,
                phase: Phase::Open,
                before_close: None,
            })),
            scheduler,
            completion: Completion::new(),
        }
    }

    /// Enqueue one chunk of content.
    ///
    /// Fails with [`StreamError::ClosedConnection`] if the body is closed;
    /// the queue is left untouched in that case.
    pub fn chunk(&self, content: impl Into<Chunk>) -> Result<(), StreamError> {
        self.chunk_group(vec![content.into()])
    }

    /// Enqueue a group of chunks delivered back-to-back in one pass.
    pub fn chunk_group(&self, group: Vec<Chunk>) -> Result<(), StreamError> {
        let deliver = {
            let mut state = self.lock();
            if state.phase != Phase::Open {
                return Err(StreamError::ClosedConnection);
            }
            state.queue.push_back(group);
            state.consumer_registered
        };
        if deliver {
            self.schedule_delivery_pass();
        }
        Ok(())
    }

    /// Register the consumer that receives chunks.
    ///
    /// Only one consumer may be registered over the body's lifetime; a
    /// second registration fails with
    /// [`StreamError::ConsumerAlreadyRegistered`].
    pub fn on_chunk(&self, consumer: impl FnMut(Chunk) + Send + 'static) -> Result<(), StreamError> {
        let pending = {
            let mut state = self.lock();
            if state.consumer_registered {
                return Err(StreamError::ConsumerAlreadyRegistered);
            }
            state.consumer_registered = true;
            state.consumer = Some(Box::new(consumer));
            !state.queue.is_empty()
        };
        if pending {
            self.schedule_delivery_pass();
        }
        Ok(())
    }

    /// Register a callback to run when the body finalizes.
    ///
    /// Late registration is supported: if the body has already finalized the
    /// callback runs immediately.
    pub fn on_finalize(&self, callback: impl FnOnce() + Send + 'static) {
        self.completion.on_complete(callback);
    }

    /// Register a one-shot hook to run just before a graceful close.
    ///
    /// The hook runs while the body is still open, so it may enqueue a final
    /// chunk; that chunk is drained before finalization. The hook never runs
    /// on [`close_now`](Self::close_now). Registering after close has
    /// started is a silent no-op; registering twice replaces the earlier
    /// hook.
    pub fn before_close(&self, hook: impl FnOnce() + Send + 'static) {
        let mut state = self.lock();
        if state.phase != Phase::Open {
            return;
        }
        state.before_close = Some(Box::new(hook));
    }

    /// The narrowed view of this body handed to the host server.
    pub fn source(&self) -> crate::BodySource {
        crate::BodySource::new(self.clone())
    }

    /// True if no chunk groups are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// True once the body has closed. Monotonic.
    pub fn is_closed(&self) -> bool {
        self.lock().phase != Phase::Open
    }

    /// True once the body has finalized.
    pub fn is_finalized(&self) -> bool {
        self.completion.is_complete()
    }

    /// Close the body.
    ///
    /// With `flush == true` this is a graceful close: the before-close hook
    /// (if any) runs first, and every chunk queued at that point - including
    /// anything the hook enqueued - is delivered before the finalize signal
    /// fires. With `flush == false` pending chunks are dropped at call time
    /// and the body finalizes on the next loop turn.
    ///
    /// Closing an already-finalized body is a no-op, as is a second graceful
    /// close. A hard close while a graceful close is still draining drops
    /// the remainder of the queue; the finalize signal still fires exactly
    /// once.
    pub fn close(&self, flush: bool) {
        let hook = {
            let mut state = self.lock();
            if state.phase != Phase::Open {
                None
            } else if flush {
                state.before_close.take()
            } else {
                None
            }
        };
        if let Some(hook) = hook {
            // Still open here: the hook may enqueue a final chunk.
            hook();
        }

        {
            let mut state = self.lock();
            match state.phase {
                Phase::Finalized => return,
                // Already draining; only a hard close changes anything.
                Phase::Closing if flush => return,
                _ => {}
            }
            if !flush {
                // Drop at call time, not on the scheduled check, so a
                // delivery pass already in the task queue finds nothing.
                state.queue.clear();
            }
            state.phase = Phase::Closing;
        }
        tracing::debug!(flush, "deferred body closed");

        let body = self.clone();
        self.scheduler
            .schedule(Box::new(move || body.finalize_if_drained()));
    }

    /// Close without draining: pending chunks are dropped and the
    /// before-close hook does not run.
    pub fn close_now(&self) {
        self.close(false);
    }

    fn schedule_delivery_pass(&self) {
        let body = self.clone();
        self.scheduler
            .schedule(Box::new(move || body.run_delivery_pass()));
    }

    /// Deliver at most one chunk group, then reschedule or finalize.
    ///
    /// Bounding each pass to one group keeps the loop cooperative: other
    /// scheduled callbacks get a turn between groups.
    fn run_delivery_pass(&self) {
        let (group, mut consumer) = {
            let mut state = self.lock();
            if state.phase == Phase::Finalized {
                return;
            }
            // An in-flight pass re-checks the queue when it finishes, so
            // overlapping passes can simply bow out.
            if state.delivering {
                return;
            }
            let Some(consumer) = state.consumer.take() else {
                // No consumer yet: chunks stay queued, no error.
                if state.queue.is_empty() && state.phase == Phase::Closing {
                    drop(state);
                    self.finalize();
                }
                return;
            };
            match state.queue.pop_front() {
                Some(group) => {
                    state.delivering = true;
                    (group, consumer)
                }
                None => {
                    state.consumer = Some(consumer);
                    if state.phase == Phase::Closing {
                        drop(state);
                        self.finalize();
                    }
                    return;
                }
            }
        };

        // Lock released: a re-entrant consumer may call chunk() freely.
        for chunk in group {
            consumer(chunk);
        }

        let next = {
            let mut state = self.lock();
            state.consumer = Some(consumer);
            state.delivering = false;
            if !state.queue.is_empty() {
                PassOutcome::Continue
            } else if state.phase == Phase::Closing {
                PassOutcome::Finalize
            } else {
                PassOutcome::Idle
            }
        };
        match next {
            PassOutcome::Continue => self.schedule_delivery_pass(),
            PassOutcome::Finalize => self.finalize(),
            PassOutcome::Idle => {}
        }
    }

    fn finalize_if_drained(&self) {
        let finalize = {
            let state = self.lock();
            state.phase == Phase::Closing && state.queue.is_empty()
        };
        if finalize {
            self.finalize();
        }
    }

    fn finalize(&self) {
        {
            let mut state = self.lock();
            if state.phase == Phase::Finalized {
                return;
            }
            state.phase = Phase::Finalized;
        }
        tracing::debug!("deferred body finalized");
        self.completion.complete();
    }

    fn lock(&self) -> MutexGuard<'_, BodyState> {
        // A poisoned lock means a consumer panicked mid-delivery; the state
        // itself is still coherent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum PassOutcome {
    Continue,
    Finalize,
    Idle,
}

impl std::fmt::Debug for DeferredBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("DeferredBody")
            .field("phase", &state.phase)
            .field("queued_groups", &state.queue.len())
            .field("consumer_registered", &state.consumer_registered)
            .finish()
    }
}
