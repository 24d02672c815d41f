//! Buffered responses.
//!
//! A [`Response`] keeps status, header multi-map, and body bytes in memory
//! until the server converts it for the wire. Middleware such as
//! [`AgentContext`](crate::AgentContext) relies on that: the handler's
//! output is recorded, inspected, and rewritten after the handler returns.

use bytes::Bytes;
use http_body_util::Full;
use tracing::warn;

use crate::status::Status;

/// Body media types the builder knows how to label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    /// `application/vnd.hac+json`
    AgentJson,
    /// `application/json`
    Json,
    /// `text/plain; charset=utf-8`
    Text,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgentJson => crate::model::MEDIA_TYPE,
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

/// An outgoing HTTP response.
///
/// ```rust
/// use hac::{Response, Status};
///
/// let ok = Response::json(br#"{"id":1}"#.to_vec());
/// assert_eq!(ok.status_code(), 200);
///
/// let created = Response::builder()
///     .status(Status::Created)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// assert_eq!(created.header("Location"), Some("/users/42"));
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200`, `text/plain`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Bare status, no headers, empty body.
    pub fn status(code: impl Into<u16>) -> Self {
        Self::builder().status(code).empty()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: Status::Ok.into(), headers: Vec::new() }
    }

    /// `200` unless the handler chose otherwise.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Every header in insertion order, repeats included. Names keep the
    /// casing they were set with.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Wire conversion. An out-of-range status is sent as `500`; header
    /// pairs hyper rejects are dropped. Both are logged at `warn`.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let status = http::StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(status = self.status, "handler returned an invalid status code");
            http::StatusCode::INTERNAL_SERVER_ERROR
        });

        let mut out = http::Response::new(Full::new(Bytes::from(self.body)));
        *out.status_mut() = status;

        for (name, value) in self.headers {
            let parsed = http::HeaderName::from_bytes(name.as_bytes())
                .ok()
                .zip(http::HeaderValue::from_str(&value).ok());
            match parsed {
                Some((name, value)) => {
                    out.headers_mut().append(name, value);
                }
                None => warn!(header = %name, "dropping invalid response header"),
            }
        }

        out
    }
}

/// Builds a [`Response`]; finished by one of the body methods.
#[derive(Debug)]
pub struct ResponseBuilder {
    status: u16,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn status(mut self, code: impl Into<u16>) -> Self {
        self.status = code.into();
        self
    }

    /// Appends a header; repeated names are kept.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn json(self, body: Vec<u8>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into().into_bytes())
    }

    /// `content-type` goes first, ahead of any headers already added.
    pub fn bytes(mut self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.headers.insert(0, ("content-type".to_owned(), content_type.as_str().to_owned()));
        Response { body, headers: self.headers, status: self.status }
    }

    /// No body and no `content-type`, e.g. for `204`.
    pub fn empty(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }
}

/// Anything a handler may return.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

/// A status with a JSON body.
impl IntoResponse for (Status, Vec<u8>) {
    fn into_response(self) -> Response {
        Response::builder().status(self.0).json(self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_ok() {
        let res = Response::builder().header("x-trace", "abc").empty();
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("X-Trace"), Some("abc"));
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn content_type_comes_first() {
        let res = Response::builder().header("x-a", "1").text("hi");
        assert_eq!(res.headers()[0], ("content-type".to_owned(), "text/plain; charset=utf-8".to_owned()));
        assert_eq!(res.headers()[1].0, "x-a");
    }

    #[test]
    fn set_header_replaces_all_values() {
        let mut res = Response::builder()
            .header("Content-Type", "text/html")
            .json(b"{}".to_vec());
        res.set_header("content-type", "application/vnd.hac+json");
        let values = res.headers().iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .count();
        assert_eq!(values, 1);
        assert_eq!(res.header("content-type"), Some("application/vnd.hac+json"));
    }

    #[test]
    fn tuple_response() {
        let res = (Status::UnprocessableContent, br#"{"code":"x"}"#.to_vec()).into_response();
        assert_eq!(res.status_code(), 422);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn into_http_keeps_repeated_headers_and_drops_invalid() {
        let res = Response::builder()
            .status(Status::Created)
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .header("bad header", "x")
            .text("ok");
        let out = res.into_http();
        assert_eq!(out.status(), http::StatusCode::CREATED);
        assert_eq!(out.headers().get_all("set-cookie").iter().count(), 2);
        assert_eq!(out.headers().len(), 3);
    }

    #[test]
    fn invalid_status_becomes_500() {
        let out = Response::status(42u16).into_http();
        assert_eq!(out.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
