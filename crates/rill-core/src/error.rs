//! Error types shared across the framework.

use thiserror::Error;

/// Errors raised by deferred-body operations.
///
/// These are protocol violations by the producer side of a streaming
/// response. They are raised synchronously to the caller, which is the only
/// party in a position to react (for example by cancelling the timer that
/// keeps producing chunks).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// A chunk was written after the body was closed.
    #[error("attempted to write to a closed connection")]
    ClosedConnection,

    /// A second consumer was registered for the same body.
    #[error("a chunk consumer is already registered for this body")]
    ConsumerAlreadyRegistered,
}

/// Errors raised while loading route or application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file failed to parse.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A route declared an HTTP method this framework does not know.
    #[error("unknown HTTP method '{0}' in route '{1}'")]
    UnknownMethod(String, String),
}
