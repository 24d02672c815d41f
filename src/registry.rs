//! Route metadata registry.
//!
//! Maps `(method, pattern)` to the [`RouteConfig`] served to agent clients.
//! The intended use is "configure at startup, read under load", but
//! registration stays correct while traffic is flowing: lookups take the
//! shared lock, registration the exclusive one, and configs are immutable
//! `Arc`s, so a config a request already holds never changes underneath it.
//!
//! ```rust
//! use hac::{Action, Registry};
//!
//! let registry = Registry::new();
//! registry.get("/users/{id}")
//!     .description("A user account.")
//!     .action(Action::new("delete", "DELETE", "/users/{id}"))
//!     .register();
//!
//! assert!(registry.lookup(hac::Method::Get, "/users/{id}").is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::method::Method;
use crate::model::{Action, RelatedResource};

/// Agent metadata for one route. Immutable once registered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteConfig {
    pub description: String,
    pub actions: Vec<Action>,
    pub related: Vec<RelatedResource>,
}

/// Shared handle to the route metadata table.
///
/// Cloning is cheap; clones see the same table. One inner map per method,
/// so lookups borrow the pattern instead of allocating a key.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    routes: Arc<RwLock<HashMap<Method, HashMap<String, Arc<RouteConfig>>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The config for an exact `(method, pattern)` key.
    pub fn lookup(&self, method: Method, pattern: &str) -> Option<Arc<RouteConfig>> {
        self.routes.read().get(&method)?.get(pattern).cloned()
    }

    /// Every registered key, in no particular order.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.entries().into_iter()
            .map(|(method, pattern, _)| (method, pattern))
            .collect()
    }

    /// Every key with its config, taken under one read lock.
    pub fn entries(&self) -> Vec<(Method, String, Arc<RouteConfig>)> {
        let routes = self.routes.read();
        routes.iter()
            .flat_map(|(method, by_pattern)| {
                by_pattern.iter()
                    .map(move |(pattern, cfg)| (*method, pattern.clone(), Arc::clone(cfg)))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, pattern: &str) -> RouteBuilder<'_> {
        self.route(Method::Get, pattern)
    }

    pub fn post(&self, pattern: &str) -> RouteBuilder<'_> {
        self.route(Method::Post, pattern)
    }

    pub fn put(&self, pattern: &str) -> RouteBuilder<'_> {
        self.route(Method::Put, pattern)
    }

    pub fn patch(&self, pattern: &str) -> RouteBuilder<'_> {
        self.route(Method::Patch, pattern)
    }

    pub fn delete(&self, pattern: &str) -> RouteBuilder<'_> {
        self.route(Method::Delete, pattern)
    }

    /// Starts a config for any method. `pattern` is matched exactly, so it
    /// must be whatever the configured path resolver produces.
    pub fn route(&self, method: Method, pattern: &str) -> RouteBuilder<'_> {
        RouteBuilder {
            registry: self,
            method,
            pattern: pattern.to_owned(),
            config: RouteConfig::default(),
        }
    }

    fn insert(&self, method: Method, pattern: String, config: RouteConfig) {
        self.routes.write()
            .entry(method)
            .or_default()
            .insert(pattern, Arc::new(config));
    }
}

/// Accumulates one route's metadata until [`register`](RouteBuilder::register).
///
/// Nothing is visible to lookups before `register`; registering an existing
/// key replaces the old config.
#[must_use = "metadata is only stored once `register` is called"]
#[derive(Debug)]
pub struct RouteBuilder<'r> {
    registry: &'r Registry,
    method: Method,
    pattern: String,
    config: RouteConfig,
}

impl RouteBuilder<'_> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = description.into();
        self
    }

    /// Replaces the action list.
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.config.actions = actions.into_iter().collect();
        self
    }

    /// Appends one action.
    pub fn action(mut self, action: Action) -> Self {
        self.config.actions.push(action);
        self
    }

    /// Replaces the related-resource list.
    pub fn related(mut self, related: impl IntoIterator<Item = RelatedResource>) -> Self {
        self.config.related = related.into_iter().collect();
        self
    }

    /// Appends one related resource.
    pub fn relate(mut self, related: RelatedResource) -> Self {
        self.config.related.push(related);
        self
    }

    pub fn register(self) {
        self.registry.insert(self.method, self.pattern, self.config);
    }
}
