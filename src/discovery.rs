//! Root discovery document.
//!
//! Agents probing an API start at its root. [`Discovery`] derives the list of
//! resources from the [`Registry`] (one entry per path, with every method
//! registered on it) and serves it only to clients negotiating the agent
//! media type. The discovery endpoint itself needs no registry entry.
//!
//! ```rust
//! use hac::{Discovery, Registry, Router};
//!
//! let registry = Registry::new();
//! registry.get("/users").description("List all users.").register();
//! registry.post("/users").register();
//!
//! let discovery = Discovery::generate("My API", "1.0", "A sample REST API.", &registry);
//! assert_eq!(discovery.meta().resources[0].methods, ["GET", "POST"]);
//!
//! let app = Router::new().get("/", discovery.handler());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::error;

use crate::handler::{BoxedHandler, Handler};
use crate::media::wants_agent_context;
use crate::model::{DiscoveryDocument, DiscoveryMeta, ResourceEntry};
use crate::registry::Registry;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::status::Status;

/// A discovery document and the handler that serves it.
#[derive(Clone, Debug)]
pub struct Discovery {
    meta: DiscoveryMeta,
}

#[derive(Default)]
struct PathGroup<'a> {
    methods: BTreeSet<&'static str>,
    description: Option<&'a str>,
}

impl Discovery {
    /// Wraps a hand-written document.
    pub fn new(meta: DiscoveryMeta) -> Self {
        Self { meta }
    }

    /// Builds the document from everything registered in `registry`.
    ///
    /// Patterns that embed their method (`"GET /users"`) are grouped under
    /// the bare path. Empty `version` / `description` are left out.
    pub fn generate(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        registry: &Registry,
    ) -> Self {
        let mut entries = registry.entries();
        entries.sort_by(|a, b| (&a.1, a.0.as_str()).cmp(&(&b.1, b.0.as_str())));

        // BTreeMap keeps the resources sorted by href.
        let mut groups: BTreeMap<&str, PathGroup<'_>> = BTreeMap::new();
        for (method, pattern, config) in &entries {
            let group = groups.entry(strip_method(pattern)).or_default();
            group.methods.insert(method.as_str());
            if group.description.is_none() && !config.description.is_empty() {
                group.description = Some(config.description.as_str());
            }
        }

        let resources = groups.into_iter()
            .map(|(path, group)| ResourceEntry {
                rel: derive_rel(path).to_owned(),
                href: path.to_owned(),
                description: group.description.map(str::to_owned),
                methods: group.methods.into_iter().map(str::to_owned).collect(),
            })
            .collect();

        Self::new(DiscoveryMeta {
            name: name.into(),
            version: non_empty(version.into()),
            description: non_empty(description.into()),
            resources,
        })
    }

    pub fn meta(&self) -> &DiscoveryMeta {
        &self.meta
    }

    /// Serves the document to agent clients; everyone else gets `404`.
    pub fn handler(self) -> impl Handler {
        self.serve(None)
    }

    /// Serves the document to agent clients; everyone else goes to `fallback`.
    pub fn handler_with_fallback(self, fallback: impl Handler) -> impl Handler {
        self.serve(Some(fallback.into_boxed_handler()))
    }

    fn serve(self, fallback: Option<BoxedHandler>) -> impl Handler {
        let discovery = Arc::new(self);
        move |req: Request| {
            let discovery = Arc::clone(&discovery);
            let fallback = fallback.clone();
            async move {
                let accept = req.header_values("accept").collect::<Vec<_>>().join(", ");
                if wants_agent_context(&accept) {
                    return discovery.respond();
                }
                match fallback {
                    Some(handler) => handler.call(req).await,
                    None => Response::status(Status::NotFound),
                }
            }
        }
    }

    fn respond(&self) -> Response {
        let doc = DiscoveryDocument { meta: self.meta.clone() };
        match serde_json::to_vec(&doc) {
            Ok(body) => Response::builder()
                .header("vary", "Accept")
                .bytes(ContentType::AgentJson, body),
            Err(e) => {
                error!("failed to serialize discovery document: {e}");
                Response::builder()
                    .status(Status::InternalServerError)
                    .text("Internal Server Error")
            }
        }
    }
}

/// `"GET /users/{id}"` → `"/users/{id}"`; anything else is returned as is.
fn strip_method(pattern: &str) -> &str {
    match pattern.find(" /") {
        Some(idx) => &pattern[idx + 1..],
        None => pattern,
    }
}

/// First literal path segment, or `root` when there is none.
///
/// `/users/{id}` → `users`, `/` → `root`, `/{tenant}` → `root`.
fn derive_rel(path: &str) -> &str {
    path.split('/')
        .find(|seg| !seg.is_empty() && !seg.starts_with('{'))
        .unwrap_or("root")
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
