//! Middleware layer.
//!
//! Middleware sits between the router and the matched handler. Each layer
//! receives the request and a [`Next`] for the rest of the chain; it may
//! short-circuit with its own response, call `next.run(req)` and rewrite the
//! result, or pass straight through.
//!
//! Layers run in the order they were added with
//! [`Router::layer`](crate::Router::layer), outermost first. The chain always
//! ends at the matched route's handler, or the router fallback when no route
//! matched, so a layer sees unmatched requests too.
//!
//! Built-in middleware:
//! - [`AgentContext`]: agent-oriented response envelopes via content negotiation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

pub mod agent;

pub use agent::{AgentContext, AgentRequested, MatchedRoute, PathResolver, RawPath, is_agent_requested};

/// A boxed future borrowed for the duration of one middleware call.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request/response interceptor.
///
/// ```rust
/// use hac::middleware::{BoxFuture, Middleware, Next};
/// use hac::{Request, Response};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
///         Box::pin(async move {
///             let mut res = next.run(req).await;
///             res.set_header("x-powered-by", "hac");
///             res
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// The remainder of the middleware chain.
///
/// Consumed by [`Next::run`], so a layer calls downstream at most once.
pub struct Next<'a> {
    layers: &'a [Arc<dyn Middleware>],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(layers: &'a [Arc<dyn Middleware>], endpoint: &'a BoxedHandler) -> Self {
        Self { layers, endpoint }
    }

    /// Runs the next layer, or the endpoint handler when no layers remain.
    pub async fn run(self, req: Request) -> Response {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.handle(req, Next::new(rest, self.endpoint)).await,
            None => self.endpoint.call(req).await,
        }
    }
}
