//! Public SDK for the Rill streaming-response framework.
//!
//! This crate re-exports the framework crates:
//!
//! ```ignore
//! use rill_sdk::prelude::*;
//!
//! let router = Router::new(scheduler).stream_route(
//!     RouteEntry::new("/ticks"),
//!     |_ctx, streaming, env| {
//!         streaming.stream("tick\n").unwrap();
//!         streaming.stream_last("tock\n").unwrap();
//!         streaming.respond(env, StatusCode::OK, HeaderMap::new())
//!     },
//! );
//! ```

pub use rill_core;
pub use rill_router;
pub use rill_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use rill_core::*;
    pub use rill_router::*;
    pub use rill_streaming::*;
}
