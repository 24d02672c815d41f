//! Envelope construction.
//!
//! Neither builder fails. A malformed upstream body degrades to a `null`
//! payload or to a status-text error; it is never reported as a failure of
//! this layer.

use serde_json::Value;
use serde_json::value::RawValue;

use crate::model::{ErrorEnvelope, HacError, HacMeta, SPEC_VERSION, SuccessEnvelope};
use crate::registry::RouteConfig;
use crate::request::Request;
use crate::status::reason_phrase;

/// Turns an upstream error response into a [`HacError`].
///
/// Return `None` to fall back to the default mapping. Any
/// `Fn(u16, &[u8], &Request) -> Option<HacError>` closure qualifies.
///
/// The request is the one the downstream handler received, including the
/// [`AgentRequested`](crate::middleware::AgentRequested) marker.
pub trait ErrorMapper: Send + Sync + 'static {
    fn map_error(&self, status: u16, body: &[u8], req: &Request) -> Option<HacError>;
}

impl<F> ErrorMapper for F
where
    F: Fn(u16, &[u8], &Request) -> Option<HacError> + Send + Sync + 'static,
{
    fn map_error(&self, status: u16, body: &[u8], req: &Request) -> Option<HacError> {
        self(status, body, req)
    }
}

/// Wraps `body` and the route's metadata in a success envelope.
///
/// The payload is the body verbatim when it is non-empty, well-formed JSON,
/// and `null` otherwise.
pub fn build_success(body: &[u8], config: Option<&RouteConfig>) -> SuccessEnvelope {
    let mut meta = HacMeta {
        version: SPEC_VERSION.to_owned(),
        description: None,
        actions: Vec::new(),
        related: Vec::new(),
    };
    if let Some(cfg) = config {
        meta.description = Some(cfg.description.clone()).filter(|d| !d.is_empty());
        meta.actions = cfg.actions.clone();
        meta.related = cfg.related.clone();
    }

    SuccessEnvelope { data: raw_payload(body), meta }
}

/// `None` serializes as `null`.
fn raw_payload(body: &[u8]) -> Option<Box<RawValue>> {
    let text = std::str::from_utf8(body).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    RawValue::from_string(text.to_owned()).ok()
}

/// Builds an error envelope.
///
/// `custom` is what an [`ErrorMapper`] produced, if one ran; it is used
/// verbatim. Otherwise the status and body are mapped by default rules:
///
/// - code and message are the status reason phrase (`"Not Found"`);
/// - a JSON object body's `code` string overrides the code, and its `message`
///   (or failing that, `error`) string overrides the message;
/// - `429` and every `5xx` are retryable.
pub fn build_error(status: u16, body: &[u8], custom: Option<HacError>) -> ErrorEnvelope {
    ErrorEnvelope { error: custom.unwrap_or_else(|| default_error(status, body)) }
}

fn default_error(status: u16, body: &[u8]) -> HacError {
    let reason = reason_phrase(status);
    let mut err = HacError::new(reason, reason)
        .retryable(status == 429 || status >= 500);

    // Only a JSON object can override the status text.
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
        return err;
    };
    let text = |key: &str| match fields.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    if let Some(code) = text("code") {
        err.code = code;
    }
    if let Some(message) = text("message").or_else(|| text("error")) {
        err.message = message;
    }
    err
}
