//! Deferred-body streaming core.
//!
//! An endpoint that opts into streaming mode does not return a finished
//! body. It writes chunks into a [`DeferredBody`] - possibly long after the
//! dispatch stack has unwound - and the host server drains them through a
//! registered consumer. The pieces:
//!
//! - [`Chunk`] - one opaque unit of body content
//! - [`Schedule`] - the injected "next tick" primitive
//! - [`Completion`] - one-shot finalize signal
//! - [`DeferredBody`] - the buffering/closing entity
//! - [`StreamingResponse`] - the facade endpoint handlers call
//! - [`HostEnv`] / [`Dispatch`] - the handoff to the host's async-response
//!   facility and the deferred sentinel the dispatch layer recognizes
//!
//! Everything takes effect through scheduled callbacks; no operation blocks
//! and no chunk is ever delivered on the stack that produced it.

mod body;
mod chunk;
mod complete;
mod respond;
mod response;
mod schedule;
mod source;

pub use body::*;
pub use chunk::*;
pub use complete::*;
pub use respond::*;
pub use response::*;
pub use schedule::*;
pub use source::*;

pub use rill_core::StreamError;
