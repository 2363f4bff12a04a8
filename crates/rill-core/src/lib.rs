//! Core abstractions for the Rill streaming-response framework.
//!
//! This crate provides the fundamental types shared by the router and the
//! streaming core:
//! - `RequestContext` - Typed request parameters
//! - `RouteConfig` / `AppConfig` - Route and application configuration
//! - `ResponseParts` - A completed response triple
//! - `StreamError` / `ConfigError` - Error taxonomy

mod config;
mod context;
mod error;
mod response;

pub use config::*;
pub use context::*;
pub use error::*;
pub use response::*;
