//! The body as seen by the host server integration.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use futures::Stream;
use rill_core::StreamError;

use crate::{Chunk, DeferredBody};

/// Narrowed view of a [`DeferredBody`] handed to the host server.
///
/// The host sees exactly two things: a consumer registration for incoming
/// chunks and a finalize signal meaning "no more chunks; the connection may
/// close". Turning chunks into wire bytes is the host's job.
#[derive(Debug, Clone)]
pub struct BodySource {
    body: DeferredBody,
}

impl BodySource {
    pub(crate) fn new(body: DeferredBody) -> Self {
        Self { body }
    }

    /// Register the callback that receives chunks.
    ///
    /// Fails if a consumer is already registered.
    pub fn on_chunk(
        &self,
        consumer: impl FnMut(Chunk) + Send + 'static,
    ) -> Result<(), StreamError> {
        self.body.on_chunk(consumer)
    }

    /// Register a callback for the finalize signal. Fires immediately if the
    /// body has already finalized.
    pub fn on_finalize(&self, callback: impl FnOnce() + Send + 'static) {
        self.body.on_finalize(callback)
    }

    /// True once the body has finalized.
    pub fn is_finalized(&self) -> bool {
        self.body.is_finalized()
    }

    /// Adapt the source into a [`futures::Stream`] of chunks.
    ///
    /// This consumes the single consumer registration, so it fails if a
    /// callback consumer was already installed. The stream ends after the
    /// finalize signal.
    pub fn into_stream(self) -> Result<BodyStream, StreamError> {
        let shared = Arc::new(Mutex::new(StreamState {
            ready: VecDeque::new(),
            waker: None,
            finished: false,
        }));

        let chunk_state = shared.clone();
        self.on_chunk(move |chunk| {
            let mut state = lock(&chunk_state);
            state.ready.push_back(chunk);
            if let Some(waker) = state.waker.take() {
                waker.wake();
            }
        })?;

        let finalize_state = shared.clone();
        self.on_finalize(move || {
            let mut state = lock(&finalize_state);
            state.finished = true;
            if let Some(waker) = state.waker.take() {
                waker.wake();
            }
        });

        Ok(BodyStream { shared })
    }
}

struct StreamState {
    ready: VecDeque<Chunk>,
    waker: Option<Waker>,
    finished: bool,
}

fn lock(state: &Arc<Mutex<StreamState>>) -> std::sync::MutexGuard<'_, StreamState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Poll-based adapter over a [`BodySource`].
///
/// Yields chunks in delivery order and ends after finalize. Chunks already
/// delivered before the stream is first polled are retained, so no data is
/// lost to the adapter itself.
pub struct BodyStream {
    shared: Arc<Mutex<StreamState>>,
}

impl Stream for BodyStream {
    type Item = Chunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = lock(&self.shared);
        if let Some(chunk) = state.ready.pop_front() {
            return Poll::Ready(Some(chunk));
        }
        if state.finished {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.shared);
        f.debug_struct("BodyStream")
            .field("ready", &state.ready.len())
            .field("finished", &state.finished)
            .finish()
    }
}
