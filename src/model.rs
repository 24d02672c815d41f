//! Wire types for agent metadata, envelopes, and discovery documents.
//!
//! Everything here serializes to the shapes agent clients parse, and
//! deserializes back so Rust clients can consume them too. Absent options,
//! empty lists and `false` flags are left out of the JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

/// The media type agent clients put in `Accept` to opt in.
pub const MEDIA_TYPE: &str = "application/vnd.hac+json";

/// Protocol version stamped into every resource envelope.
pub const SPEC_VERSION: &str = "1.0";

fn is_false(b: &bool) -> bool {
    !*b
}

/// Whether an action changes state, and whether that change can be undone.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    ReadOnly,
    Reversible,
    Irreversible,
}

/// How far the side effects of an action reach.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlastRadius {
    /// Only the resource the action is invoked on.
    #[serde(rename = "self")]
    SelfOnly,
    SelfAndAssociated,
    Many,
    All,
}

/// Risk assessment for an [`Action`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Safety {
    pub mutability: Mutability,
    pub blast_radius: BlastRadius,
    /// Human-readable window during which the action can be reversed, e.g. `"30 days"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversible_within: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub confirmation_recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
}

impl Safety {
    pub fn new(mutability: Mutability, blast_radius: BlastRadius) -> Self {
        Self {
            mutability,
            blast_radius,
            reversible_within: None,
            confirmation_recommended: false,
            cost: None,
        }
    }

    pub fn reversible_within(mut self, window: impl Into<String>) -> Self {
        self.reversible_within = Some(window.into());
        self
    }

    pub fn confirm(mut self) -> Self {
        self.confirmation_recommended = true;
        self
    }

    pub fn cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }
}

/// Monetary cost of performing an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A typed input an action accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: None,
            required: false,
            allowed: Vec::new(),
            default: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allowed(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = values.into_iter().collect();
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A hypermedia action an agent can invoke.
///
/// ```rust
/// use hac::{Action, BlastRadius, Mutability, Safety};
///
/// let delete = Action::new("delete", "DELETE", "/users/{id}")
///     .description("Permanently delete this user.")
///     .safety(Safety::new(Mutability::Irreversible, BlastRadius::SelfAndAssociated).confirm());
/// assert_eq!(delete.rel, "delete");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub rel: String,
    pub method: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<Safety>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<String>,
}

impl Action {
    pub fn new(rel: impl Into<String>, method: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            method: method.into(),
            href: href.into(),
            description: None,
            safety: None,
            fields: Vec::new(),
            preconditions: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn safety(mut self, safety: Safety) -> Self {
        self.safety = Some(safety);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn precondition(mut self, condition: impl Into<String>) -> Self {
        self.preconditions.push(condition.into());
        self
    }
}

/// A link to a related resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelatedResource {
    pub rel: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RelatedResource {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self { rel: rel.into(), href: href.into(), description: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Metadata block attached to a single resource response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HacMeta {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedResource>,
}

/// `{"data": …, "_meta": …}`
///
/// `data` is the upstream payload verbatim; it is never re-encoded. `None`
/// (empty or malformed upstream body) is written as `null`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub data: Option<Box<RawValue>>,
    #[serde(rename = "_meta")]
    pub meta: HacMeta,
}

/// Structured error with optional recovery guidance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HacError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub retryable: bool,
    /// Seconds to wait before retrying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

impl HacError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: false,
            retry_after: None,
            recovery: None,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn recovery(mut self, recovery: Recovery) -> Self {
        self.recovery = Some(recovery);
        self
    }
}

/// How an agent can get out of an error state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recovery {
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Recovery {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), actions: Vec::new() }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// `{"error": …}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: HacError,
}

/// `{"_meta": …}` served from the API root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(rename = "_meta")]
    pub meta: DiscoveryMeta,
}

/// Describes the API and the resources it exposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: Vec<ResourceEntry>,
}

/// One discoverable resource path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub rel: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sorted, without duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}
