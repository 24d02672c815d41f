//! # hac
//!
//! HTTP Agent Context: machine-actionable metadata for existing JSON APIs.
//!
//! A client that sends `Accept: application/vnd.hac+json` gets every
//! response wrapped in an envelope describing what the resource is, what
//! can be done to it next, and how risky each action is. Every other client
//! gets exactly the bytes the handler produced.
//!
//! The pieces:
//!
//! - [`media`]: `Accept` parsing and negotiation
//! - [`Registry`]: route metadata keyed by method and pattern
//! - [`build_success`] / [`build_error`]: envelope construction
//! - [`AgentContext`]: the middleware tying them together
//! - [`Discovery`]: a root document listing every described resource
//!
//! plus a small host (router, server) to plug them into.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hac::{
//!     Action, AgentContext, BlastRadius, Discovery, MatchedRoute, Mutability,
//!     Registry, Request, Response, Router, Safety, Server,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hac::Error> {
//!     let registry = Registry::new();
//!     registry.get("/users/{id}")
//!         .description("A user account.")
//!         .action(
//!             Action::new("delete", "DELETE", "/users/{id}")
//!                 .safety(Safety::new(Mutability::Irreversible, BlastRadius::SelfOnly).confirm()),
//!         )
//!         .register();
//!
//!     let discovery = Discovery::generate("Users API", "1.0", "", &registry);
//!
//!     let api = Router::new()
//!         .get("/users/{id}", get_user)
//!         .layer(AgentContext::new(registry).path_resolver(MatchedRoute));
//!
//!     // The discovery root sits outside the agent layer: it has no
//!     // registry entry of its own.
//!     let app = Router::new()
//!         .get("/", discovery.handler())
//!         .fallback(api.into_handler());
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("0");
//!     Response::json(format!(r#"{{"id":{id},"name":"Alice"}}"#).into_bytes())
//! }
//! ```

mod config;
mod discovery;
mod envelope;
mod error;
mod handler;
mod method;
mod model;
mod registry;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod media;
pub mod middleware;

pub use config::{LISTEN_ENV, ServerConfig};
pub use discovery::Discovery;
pub use envelope::{ErrorMapper, build_error, build_success};
pub use error::Error;
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use middleware::{AgentContext, MatchedRoute, PathResolver, RawPath, is_agent_requested};
pub use model::{
    Action, BlastRadius, Cost, DiscoveryDocument, DiscoveryMeta, ErrorEnvelope, Field, HacError,
    HacMeta, MEDIA_TYPE, Mutability, Recovery, RelatedResource, ResourceEntry, SPEC_VERSION,
    Safety, SuccessEnvelope,
};
pub use registry::{Registry, RouteBuilder, RouteConfig};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
