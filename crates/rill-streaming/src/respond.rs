//! Handoff to the host server's async-response facility.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use rill_core::ResponseParts;

use crate::BodySource;

/// The host server's hook for accepting a deferred body in place of a
/// computed response. Invoked at most once per streaming request, from a
/// scheduled task.
pub type AsyncAcceptor = Arc<dyn Fn(StatusCode, HeaderMap, BodySource) + Send + Sync>;

/// Host-environment capabilities visible to the streaming core.
///
/// A host that cannot defer responses simply leaves the acceptor unset; the
/// core reports the misconfiguration instead of failing the process.
#[derive(Clone, Default)]
pub struct HostEnv {
    acceptor: Option<AsyncAcceptor>,
}

impl HostEnv {
    /// An environment with no async-response support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the async-response acceptor.
    pub fn with_acceptor(
        mut self,
        acceptor: impl Fn(StatusCode, HeaderMap, BodySource) + Send + Sync + 'static,
    ) -> Self {
        self.acceptor = Some(Arc::new(acceptor));
        self
    }

    /// The configured acceptor, if any.
    pub fn acceptor(&self) -> Option<AsyncAcceptor> {
        self.acceptor.clone()
    }

    /// Whether this host can accept deferred responses.
    pub fn supports_streaming(&self) -> bool {
        self.acceptor.is_some()
    }
}

impl std::fmt::Debug for HostEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostEnv")
            .field("acceptor", &self.acceptor.is_some())
            .finish()
    }
}

/// Outcome of dispatching one request.
///
/// `Deferred` is the sentinel meaning "this response is not complete; do not
/// write anything for this request on this call stack". It is a distinct
/// variant precisely so the dispatch layer recognizes it by tag - an
/// ordinary empty-bodied 200 is a `Complete` value and can never be mistaken
/// for it.
#[derive(Debug)]
pub enum Dispatch {
    /// A fully-computed response to write out now.
    Complete(ResponseParts),
    /// The response will be delivered later through the host's
    /// async-response facility.
    Deferred,
}

impl Dispatch {
    /// True if this is the deferred sentinel.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred)
    }

    /// The completed response, if there is one to write synchronously.
    pub fn into_parts(self) -> Option<ResponseParts> {
        match self {
            Self::Complete(parts) => Some(parts),
            Self::Deferred => None,
        }
    }
}

impl From<ResponseParts> for Dispatch {
    fn from(parts: ResponseParts) -> Self {
        Self::Complete(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ok_is_not_deferred() {
        // An empty 200 must remain distinguishable from the sentinel.
        let dispatch = Dispatch::from(ResponseParts::ok(""));
        assert!(!dispatch.is_deferred());
        assert!(dispatch.into_parts().is_some());
    }

    #[test]
    fn test_deferred_has_no_parts() {
        let dispatch = Dispatch::Deferred;
        assert!(dispatch.is_deferred());
        assert!(dispatch.into_parts().is_none());
    }

    #[test]
    fn test_host_env_without_acceptor() {
        let env = HostEnv::new();
        assert!(!env.supports_streaming());
        assert!(env.acceptor().is_none());
    }

    #[test]
    fn test_host_env_with_acceptor() {
        let env = HostEnv::new().with_acceptor(|_, _, _| {});
        assert!(env.supports_streaming());
    }
}
