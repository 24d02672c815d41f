//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. The router also records
//! which pattern matched, so pattern-aware middleware (see
//! [`MatchedRoute`](crate::middleware::MatchedRoute)) can key metadata on
//! `/users/{id}` instead of the literal `/users/42`.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

struct Route {
    pattern: String,
    handler: BoxedHandler,
}

pub(crate) struct Matched {
    pub(crate) pattern: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) params: HashMap<String, String>,
}

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
    layers: Vec<Arc<dyn Middleware>>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            layers: Vec::new(),
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if the path is not a valid pattern or conflicts with an
    /// existing one. Routes are built at startup, so this fails fast.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let route = Route { pattern: path.to_owned(), handler: handler.into_boxed_handler() };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Wraps every request in `middleware`. The first layer added is the
    /// outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Handler for requests no route matches. Defaults to a bare `404`.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = handler.into_boxed_handler();
        self
    }

    /// Routes one request through the middleware chain and its handler.
    pub async fn handle(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(req.method, &req.path) {
            Some(matched) => {
                req.params = matched.params;
                req.route = Some(matched.pattern);
                matched.handler
            }
            None => Arc::clone(&self.fallback),
        };

        Next::new(&self.layers, &endpoint).run(req).await
    }

    /// Turns the whole router, layers included, into one handler.
    ///
    /// Mount it as another router's fallback to keep some routes (such as
    /// a discovery root) outside this router's layers.
    pub fn into_handler(self) -> impl Handler {
        let router = Arc::new(self);
        move |req: Request| {
            let router = Arc::clone(&router);
            async move { router.handle(req).await }
        }
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<Matched> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some(Matched {
            pattern: matched.value.pattern.clone(),
            handler: Arc::clone(&matched.value.handler),
            params,
        })
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    Response::status(Status::NotFound)
}
