//! Request dispatch.

use std::sync::Arc;

use rill_core::{Method, RequestContext, ResponseParts};
use rill_streaming::{Dispatch, HostEnv, SharedScheduler, StreamingResponse};

use crate::{RouteEntry, RouteRegistry};

/// Handler for an ordinary route: computes a full response on the dispatch
/// stack.
pub type PlainHandler = Box<dyn Fn(&RequestContext) -> ResponseParts + Send + Sync>;

/// Handler for a streaming route: writes through the facade (now or from
/// later scheduled callbacks) and returns the dispatch outcome - normally
/// the deferred sentinel obtained from
/// [`StreamingResponse::respond`].
pub type StreamingHandler =
    Box<dyn Fn(&RequestContext, &StreamingResponse, &HostEnv) -> Dispatch + Send + Sync>;

enum RouteTarget {
    Plain(PlainHandler),
    Streaming(StreamingHandler),
}

/// Routes requests to handlers and mediates the streaming handoff.
pub struct Router {
    registry: RouteRegistry,
    targets: Vec<RouteTarget>,
    scheduler: SharedScheduler,
}

impl Router {
    /// Create a router scheduling streaming work on `scheduler`.
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            registry: RouteRegistry::new(),
            targets: Vec::new(),
            scheduler,
        }
    }

    /// Register an ordinary route.
    pub fn route(
        mut self,
        entry: RouteEntry,
        handler: impl Fn(&RequestContext) -> ResponseParts + Send + Sync + 'static,
    ) -> Self {
        self.registry.register(entry.with_stream(false));
        self.targets.push(RouteTarget::Plain(Box::new(handler)));
        self
    }

    /// Register a streaming route.
    ///
    /// The handler receives the per-request facade; whatever it does with
    /// it, dispatch returns to the caller immediately.
    pub fn stream_route(
        mut self,
        entry: RouteEntry,
        handler: impl Fn(&RequestContext, &StreamingResponse, &HostEnv) -> Dispatch + Send + Sync + 'static,
    ) -> Self {
        self.registry.register(entry.with_stream(true));
        self.targets.push(RouteTarget::Streaming(Box::new(handler)));
        self
    }

    /// The route registry.
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Dispatch one request.
    ///
    /// The returned [`Dispatch`] is checked by tag: `Complete` carries a
    /// response to write now, `Deferred` means the host's async-response
    /// facility owns the rest of this request and nothing more may be
    /// written on this stack.
    pub fn dispatch(&self, env: &HostEnv, ctx: &mut RequestContext) -> Dispatch {
        let Some((index, params)) = self.registry.match_route(ctx.method, &ctx.path) else {
            tracing::debug!(request_id = %ctx.request_id, path = %ctx.path, "no route matched");
            return Dispatch::Complete(ResponseParts::not_found());
        };
        ctx.params = params;

        match &self.targets[index] {
            RouteTarget::Plain(handler) => Dispatch::Complete(handler(ctx)),
            RouteTarget::Streaming(handler) => {
                let streaming = StreamingResponse::new(Arc::clone(&self.scheduler));
                let outcome = handler(ctx, &streaming, env);
                if outcome.is_deferred() {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        path = %ctx.path,
                        "response deferred to host"
                    );
                }
                outcome
            }
        }
    }

    /// Convenience for hosts: dispatch and return the synchronously
    /// completed response, if there is one.
    pub fn dispatch_complete(
        &self,
        env: &HostEnv,
        method: Method,
        path: &str,
    ) -> Option<ResponseParts> {
        let mut ctx = RequestContext::new(method, path);
        self.dispatch(env, &mut ctx).into_parts()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.registry.routes().len())
            .finish()
    }
}
