//! Route matching and dispatch for the Rill framework.
//!
//! Routes are registered with `:param` patterns and an optional streaming
//! flag. Dispatch evaluates the matched handler and returns a
//! [`Dispatch`](rill_streaming::Dispatch) outcome; for streaming routes the
//! handler gets a per-request [`StreamingResponse`](rill_streaming::StreamingResponse)
//! facade and the router treats the deferred sentinel as "hands off - the
//! host will finish this one".

mod dispatch;
mod route;

pub use dispatch::*;
pub use route::*;
