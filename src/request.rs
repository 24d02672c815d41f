//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;

use crate::method::Method;

/// An incoming HTTP request with its body fully read.
///
/// Cloning is cheap for the body (`Bytes` is reference counted); headers and
/// params are copied.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) route: Option<String>,
    pub(crate) extensions: http::Extensions,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            body,
            params: HashMap::new(),
            route: None,
            extensions: http::Extensions::new(),
        }
    }

    /// Starts building a request by hand, for tests, or for embedding the
    /// router behind a different transport.
    ///
    /// ```rust
    /// use hac::{Method, Request};
    ///
    /// let req = Request::builder(Method::Get, "/users/1")
    ///     .header("accept", "application/vnd.hac+json")
    ///     .build();
    /// assert_eq!(req.header("Accept"), Some("application/vnd.hac+json"));
    /// ```
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder { inner: Self::new(method, path.into(), Vec::new(), Bytes::new()) }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).next()
    }

    /// Every value of a repeated header, in arrival order.
    pub fn header_values<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.headers.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The route pattern the router matched (e.g. `/users/{id}`), if any.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Request-scoped typed values attached by middleware.
    pub fn extensions(&self) -> &http::Extensions { &self.extensions }

    pub fn extensions_mut(&mut self) -> &mut http::Extensions { &mut self.extensions }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder`].
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}
