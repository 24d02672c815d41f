//! Agent-context interception.
//!
//! [`AgentContext`] is the middleware that turns ordinary JSON responses into
//! agent envelopes, but only for clients that ask for
//! `application/vnd.hac+json`. Every other request passes through untouched.
//!
//! Per request:
//!
//! ```text
//! negotiate ─┬─ agent type not wanted ────────────────────────► passthrough
//!            └─ wanted ─ resolve pattern ─ registry lookup
//!                 ├─ no metadata, agent type is the only option ► 406
//!                 ├─ no metadata, client has a fallback ────────► passthrough
//!                 └─ metadata ─ mark request ─ run handler ─ envelope ─ emit
//! ```
//!
//! The downstream handler's output is already buffered in its [`Response`],
//! so capturing it is just awaiting the handler. Emitting keeps the
//! handler's headers, replaces `content-type` with the agent media type and
//! adds `vary: Accept`. Error statuses (≥ 400) are kept; anything below
//! becomes `200`, since the body is now an envelope rather than the
//! handler's representation.
//!
//! ```rust,no_run
//! use hac::{AgentContext, MatchedRoute, Registry, Router, Server};
//! # async fn get_user(_: hac::Request) -> hac::Response { hac::Response::json(b"{}".to_vec()) }
//!
//! # async fn run() -> Result<(), hac::Error> {
//! let registry = Registry::new();
//! registry.get("/users/{id}").description("A user account.").register();
//!
//! let app = Router::new()
//!     .get("/users/{id}", get_user)
//!     .layer(AgentContext::new(registry).path_resolver(MatchedRoute));
//!
//! Server::bind("0.0.0.0:3000").serve(app).await
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, error};

use super::{BoxFuture, Middleware, Next};
use crate::envelope::{ErrorMapper, build_error, build_success};
use crate::media::{is_only_acceptable, wants_agent_context};
use crate::model::MEDIA_TYPE;
use crate::registry::{Registry, RouteConfig};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Extension marker set on requests the middleware is enveloping.
#[derive(Clone, Copy, Debug, Default)]
pub struct AgentRequested;

/// Whether this request negotiated an agent envelope.
///
/// True inside downstream handlers only when [`AgentContext`] found metadata
/// for the route and is about to envelope the response.
pub fn is_agent_requested(req: &Request) -> bool {
    req.extensions().get::<AgentRequested>().is_some()
}

/// Maps a request to the pattern its metadata is registered under.
///
/// Any `Fn(&Request) -> String` closure qualifies.
pub trait PathResolver: Send + Sync + 'static {
    fn resolve(&self, req: &Request) -> String;
}

impl<F> PathResolver for F
where
    F: Fn(&Request) -> String + Send + Sync + 'static,
{
    fn resolve(&self, req: &Request) -> String {
        self(req)
    }
}

/// The literal request path (the default).
///
/// Only suits literal route tables: `/users/42` never matches metadata
/// registered under `/users/{id}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawPath;

impl PathResolver for RawPath {
    fn resolve(&self, req: &Request) -> String {
        req.path().to_owned()
    }
}

/// The router's matched pattern (`/users/{id}`), or the raw path when no
/// route matched.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchedRoute;

impl PathResolver for MatchedRoute {
    fn resolve(&self, req: &Request) -> String {
        req.route().unwrap_or(req.path()).to_owned()
    }
}

/// Content-negotiated agent envelope middleware.
#[derive(Clone)]
pub struct AgentContext {
    registry: Registry,
    path_resolver: Arc<dyn PathResolver>,
    error_mapper: Option<Arc<dyn ErrorMapper>>,
}

impl Default for AgentContext {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl AgentContext {
    /// Envelopes routes described in `registry`, resolving patterns with
    /// [`RawPath`] and mapping errors with the default rules.
    pub fn new(registry: Registry) -> Self {
        Self { registry, path_resolver: Arc::new(RawPath), error_mapper: None }
    }

    pub fn path_resolver(mut self, resolver: impl PathResolver) -> Self {
        self.path_resolver = Arc::new(resolver);
        self
    }

    /// Consulted before the default mapping for every error response.
    pub fn error_mapper(mut self, mapper: impl ErrorMapper) -> Self {
        self.error_mapper = Some(Arc::new(mapper));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn intercept(&self, req: Request, next: Next<'_>) -> Response {
        let accept = accept_header(&req);
        if !wants_agent_context(&accept) {
            return next.run(req).await;
        }

        let pattern = self.path_resolver.resolve(&req);
        let Some(config) = self.registry.lookup(req.method(), &pattern) else {
            if is_only_acceptable(&accept) {
                debug!(method = %req.method(), %pattern, "no agent metadata and no acceptable fallback");
                return not_acceptable();
            }
            debug!(method = %req.method(), %pattern, "no agent metadata, passing through");
            return next.run(req).await;
        };

        let mut req = req;
        req.extensions_mut().insert(AgentRequested);
        let snapshot = self.error_mapper.as_ref().map(|_| req.clone());

        let recorded = next.run(req).await;
        self.emit(recorded, &config, snapshot.as_ref())
    }

    fn emit(&self, recorded: Response, config: &RouteConfig, req: Option<&Request>) -> Response {
        let status = recorded.status_code();
        let serialized = if status >= 400 {
            let custom = self.error_mapper.as_deref()
                .zip(req)
                .and_then(|(mapper, req)| mapper.map_error(status, recorded.body(), req));
            serde_json::to_vec(&build_error(status, recorded.body(), custom))
        } else {
            serde_json::to_vec(&build_success(recorded.body(), Some(config)))
        };

        let body = match serialized {
            Ok(body) => body,
            Err(e) => {
                error!(status, "failed to serialize agent envelope: {e}");
                return Response::builder()
                    .status(Status::InternalServerError)
                    .text("Internal Server Error");
            }
        };

        let mut out = Response {
            body,
            headers: recorded.headers,
            status: if status >= 400 { status } else { Status::Ok.into() },
        };
        out.remove_header("content-length");
        out.set_header("content-type", MEDIA_TYPE);
        out.set_header("vary", "Accept");
        out
    }
}

impl Middleware for AgentContext {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(self.intercept(req, next))
    }
}

/// All `Accept` lines joined, as if sent as one header.
fn accept_header(req: &Request) -> String {
    req.header_values("accept").collect::<Vec<_>>().join(", ")
}

fn not_acceptable() -> Response {
    Response::builder()
        .status(Status::NotAcceptable)
        .text("Not Acceptable: no agent metadata for this route")
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::method::Method;
    use crate::model::{Action, HacError, Recovery};
    use crate::router::Router;

    const AGENT: &str = "application/vnd.hac+json";

    fn get(path: &str, accept: &str) -> Request {
        Request::builder(Method::Get, path).header("accept", accept).build()
    }

    fn json_body(res: &Response) -> Value {
        serde_json::from_slice(res.body()).expect("valid JSON body")
    }

    async fn user(_req: Request) -> Response {
        Response::builder()
            .header("x-custom", "value")
            .header("content-length", "23")
            .json(br#"{"id":1,"name":"Alice"}"#.to_vec())
    }

    fn users_registry() -> Registry {
        let reg = Registry::new();
        reg.get("/users/1")
            .description("A user account.")
            .action(Action::new("delete", "DELETE", "/users/1"))
            .register();
        reg
    }

    #[tokio::test]
    async fn plain_clients_pass_through() {
        let app = Router::new().get("/users/1", user).layer(AgentContext::new(users_registry()));
        let res = app.handle(get("/users/1", "application/json")).await;
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("vary"), None);
        assert_eq!(res.body(), br#"{"id":1,"name":"Alice"}"#);
    }

    #[tokio::test]
    async fn agent_clients_get_success_envelope() {
        let app = Router::new().get("/users/1", user).layer(AgentContext::new(users_registry()));
        let res = app.handle(get("/users/1", AGENT)).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("content-type"), Some(AGENT));
        assert_eq!(res.header("vary"), Some("Accept"));
        assert_eq!(res.header("x-custom"), Some("value"));
        assert_eq!(res.header("content-length"), None);
        assert_eq!(
            json_body(&res),
            json!({
                "data": {"id": 1, "name": "Alice"},
                "_meta": {
                    "version": "1.0",
                    "description": "A user account.",
                    "actions": [{"rel": "delete", "method": "DELETE", "href": "/users/1"}]
                }
            }),
        );
    }

    #[tokio::test]
    async fn repeated_handler_headers_survive_enveloping() {
        let handler = |_req: Request| async {
            Response::builder()
                .header("set-cookie", "a=1")
                .header("Set-Cookie", "b=2")
                .json(br#"{"id":1}"#.to_vec())
        };
        let app = Router::new().get("/users/1", handler).layer(AgentContext::new(users_registry()));
        let res = app.handle(get("/users/1", AGENT)).await;

        assert_eq!(res.header("content-type"), Some(AGENT));
        let cookies: Vec<_> = res.headers().iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }

    #[tokio::test]
    async fn error_status_is_kept_with_error_envelope() {
        let handler = |_req: Request| async {
            Response::builder()
                .status(Status::NotFound)
                .json(br#"{"code":"not_found","message":"User not found"}"#.to_vec())
        };
        let app = Router::new().get("/users/1", handler).layer(AgentContext::new(users_registry()));
        let res = app.handle(get("/users/1", AGENT)).await;

        assert_eq!(res.status_code(), 404);
        assert_eq!(res.header("content-type"), Some(AGENT));
        assert_eq!(
            json_body(&res),
            json!({"error": {"code": "not_found", "message": "User not found"}}),
        );
    }

    #[tokio::test]
    async fn success_statuses_collapse_to_ok() {
        let handler = |_req: Request| async { Response::status(Status::NoContent) };
        let app = Router::new().get("/users/1", handler).layer(AgentContext::new(users_registry()));
        let res = app.handle(get("/users/1", AGENT)).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(json_body(&res)["data"], Value::Null);
    }

    #[tokio::test]
    async fn agent_only_without_metadata_is_406() {
        let app = Router::new().get("/unknown", user).layer(AgentContext::default());
        let res = app.handle(get("/unknown", AGENT)).await;
        assert_eq!(res.status_code(), 406);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn agent_with_fallback_and_no_metadata_passes_through() {
        let app = Router::new().get("/unknown", user).layer(AgentContext::default());
        let res = app.handle(get("/unknown", "application/vnd.hac+json, application/json;q=0.9")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), br#"{"id":1,"name":"Alice"}"#);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn handler_sees_agent_flag_only_when_enveloping() {
        let handler = |req: Request| async move {
            Response::json(format!(r#"{{"agent":{}}}"#, is_agent_requested(&req)).into_bytes())
        };
        let reg = Registry::new();
        reg.get("/test").description("Test.").register();
        let app = Router::new()
            .get("/test", handler)
            .get("/other", handler)
            .layer(AgentContext::new(reg));

        let res = app.handle(get("/test", AGENT)).await;
        assert_eq!(json_body(&res)["data"], json!({"agent": true}));

        let res = app.handle(get("/test", "application/json")).await;
        assert_eq!(json_body(&res), json!({"agent": false}));

        let res = app.handle(get("/other", "application/vnd.hac+json, */*;q=0.5")).await;
        assert_eq!(json_body(&res), json!({"agent": false}));
    }

    #[tokio::test]
    async fn raw_path_misses_parameterized_metadata() {
        let reg = Registry::new();
        reg.get("/users/{id}").description("A user.").register();
        let app = Router::new()
            .get("/users/{id}", user)
            .layer(AgentContext::new(reg));
        let res = app.handle(get("/users/1", AGENT)).await;
        assert_eq!(res.status_code(), 406);
    }

    #[tokio::test]
    async fn matched_route_resolves_parameterized_metadata() {
        let reg = Registry::new();
        reg.get("/users/{id}")
            .description("A user.")
            .action(Action::new("self", "GET", "/users/{id}"))
            .register();
        let app = Router::new()
            .get("/users/{id}", user)
            .layer(AgentContext::new(reg).path_resolver(MatchedRoute));
        let res = app.handle(get("/users/7", AGENT)).await;
        assert_eq!(res.header("content-type"), Some(AGENT));
        assert_eq!(json_body(&res)["_meta"]["description"], "A user.");
    }

    #[tokio::test]
    async fn custom_resolver_closure() {
        let reg = Registry::new();
        reg.get("GET /users/{id}").description("A user.").register();
        let app = Router::new()
            .get("/users/{id}", user)
            .layer(AgentContext::new(reg).path_resolver(|req: &Request| {
                format!("{} {}", req.method(), req.route().unwrap_or(req.path()))
            }));
        let res = app.handle(get("/users/1", AGENT)).await;
        assert_eq!(res.header("content-type"), Some(AGENT));
    }

    #[tokio::test]
    async fn error_mapper_overrides_default_mapping() {
        let handler = |_req: Request| async {
            Response::builder()
                .status(Status::UnprocessableContent)
                .json(br#"{"detail":"has subscriptions"}"#.to_vec())
        };
        let reg = Registry::new();
        reg.delete("/users/1").description("Delete user.").register();

        let mapper = |status: u16, _body: &[u8], req: &Request| {
            assert!(is_agent_requested(req));
            (status == 422).then(|| {
                HacError::new("active_subscriptions", "Cannot delete user with active subscriptions.")
                    .recovery(
                        Recovery::new("Cancel subscriptions first.")
                            .action(Action::new("cancel-subscriptions", "POST", "/users/1/cancel-subscriptions")),
                    )
            })
        };
        let app = Router::new()
            .delete("/users/1", handler)
            .layer(AgentContext::new(reg).error_mapper(mapper));

        let req = Request::builder(Method::Delete, "/users/1").header("Accept", AGENT).build();
        let res = app.handle(req).await;
        assert_eq!(res.status_code(), 422);
        let body = json_body(&res);
        assert_eq!(body["error"]["code"], "active_subscriptions");
        assert_eq!(body["error"]["recovery"]["actions"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn error_mapper_none_falls_back_to_default() {
        let handler = |_req: Request| async { Response::status(Status::ServiceUnavailable) };
        let app = Router::new()
            .get("/users/1", handler)
            .layer(AgentContext::new(users_registry()).error_mapper(|_: u16, _: &[u8], _: &Request| -> Option<HacError> { None }));
        let res = app.handle(get("/users/1", AGENT)).await;
        assert_eq!(res.status_code(), 503);
        assert_eq!(
            json_body(&res),
            json!({"error": {"code": "Service Unavailable", "message": "Service Unavailable", "retryable": true}}),
        );
    }

    #[tokio::test]
    async fn repeated_accept_headers_are_combined() {
        let app = Router::new().get("/users/1", user).layer(AgentContext::new(users_registry()));
        let req = Request::builder(Method::Get, "/users/1")
            .header("accept", "text/html")
            .header("Accept", AGENT)
            .build();
        let res = app.handle(req).await;
        assert_eq!(res.header("content-type"), Some(AGENT));
    }
}
