//! The streaming facade endpoint handlers interact with.

use std::sync::{Arc, OnceLock};

use http::{HeaderMap, StatusCode};
use rill_core::StreamError;

use crate::{Chunk, DeferredBody, Dispatch, HostEnv, Schedule, SharedScheduler};

struct ResponseInner {
    scheduler: SharedScheduler,
    body: OnceLock<DeferredBody>,
}

/// Per-request facade for producing a streaming response.
///
/// Created by the dispatch layer when a route declared `stream = true` is
/// hit. The handler (and any timers or callbacks it schedules) writes
/// through this facade; the dispatch layer calls
/// [`respond`](Self::respond) once to hand the body to the host.
///
/// The deferred body is created lazily on first use and lives for this one
/// request; handles are cheap clones, so a handler can move one into a
/// timer callback that keeps streaming after the dispatch stack unwinds.
#[derive(Clone)]
pub struct StreamingResponse {
    inner: Arc<ResponseInner>,
}

impl StreamingResponse {
    /// Create a facade scheduling its work on `scheduler`.
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            inner: Arc::new(ResponseInner {
                scheduler,
                body: OnceLock::new(),
            }),
        }
    }

    /// The underlying deferred body, created on first access.
    pub fn body(&self) -> &DeferredBody {
        self.inner
            .body
            .get_or_init(|| DeferredBody::new(self.inner.scheduler.clone()))
    }

    /// Write one chunk of body content.
    pub fn stream(&self, content: impl Into<Chunk>) -> Result<(), StreamError> {
        self.body().chunk(content)
    }

    /// Write a final chunk, then close gracefully.
    pub fn stream_last(&self, content: impl Into<Chunk>) -> Result<(), StreamError> {
        self.stream(content)?;
        self.close();
        Ok(())
    }

    /// Close gracefully: run the before-close hook, drain pending chunks,
    /// then finalize.
    pub fn close(&self) {
        self.body().close(true);
    }

    /// Close immediately: drop pending chunks and finalize on the next loop
    /// turn. The before-close hook does not run.
    pub fn close_now(&self) {
        self.body().close_now();
    }

    /// Whether the response has been closed.
    pub fn is_closed(&self) -> bool {
        self.body().is_closed()
    }

    /// Register a hook to run just before a graceful close.
    pub fn before_close(&self, hook: impl FnOnce() + Send + 'static) {
        self.body().before_close(hook);
    }

    /// Register a callback for real connection teardown (finalize).
    pub fn on_finalize(&self, callback: impl FnOnce() + Send + 'static) {
        self.body().on_finalize(callback);
    }

    /// Hand the deferred body to the host's async-response facility.
    ///
    /// Schedules a one-time call of the host's acceptor with
    /// `(status, headers, body source)` and returns [`Dispatch::Deferred`]
    /// immediately. If the host has no acceptor this reports the
    /// misconfiguration and schedules nothing; the request is left without a
    /// delivered response, which is a host configuration fault rather than
    /// an error the endpoint could handle.
    pub fn respond(&self, env: &HostEnv, status: StatusCode, headers: HeaderMap) -> Dispatch {
        match env.acceptor() {
            Some(acceptor) => {
                let source = self.body().source();
                self.inner
                    .scheduler
                    .schedule(Box::new(move || acceptor(status, headers, source)));
            }
            None => {
                tracing::error!(
                    "host environment has no async-response acceptor; \
                     streaming response will never be delivered"
                );
            }
        }
        Dispatch::Deferred
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("body", &self.inner.body.get())
            .finish()
    }
}
