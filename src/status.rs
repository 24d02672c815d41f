//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value. Raw
//! `u16` codes are accepted in the same places.
//!
//! ```rust
//! use hac::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/users/42")
//!     .json(br#"{"id":42}"#.to_vec());
//!
//! async fn delete_user(_req: hac::Request) -> Status {
//!     Status::NoContent
//! }
//! ```

/// The status codes an API handler typically returns.
///
/// Anything not listed here can still be sent as a raw `u16`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    Accepted,             // 202
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,     // 301
    Found,                // 302
    SeeOther,             // 303
    NotModified,          // 304

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    PaymentRequired,      // 402
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    NotAcceptable,        // 406
    Conflict,             // 409
    Gone,                 // 410
    PreconditionFailed,   // 412
    UnprocessableContent, // 422
    TooManyRequests,      // 429

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    BadGateway,           // 502
    ServiceUnavailable,   // 503
    GatewayTimeout,       // 504
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                   => 200,
            Status::Created              => 201,
            Status::Accepted             => 202,
            Status::NoContent            => 204,
            Status::MovedPermanently     => 301,
            Status::Found                => 302,
            Status::SeeOther             => 303,
            Status::NotModified          => 304,
            Status::BadRequest           => 400,
            Status::Unauthorized         => 401,
            Status::PaymentRequired      => 402,
            Status::Forbidden            => 403,
            Status::NotFound             => 404,
            Status::MethodNotAllowed     => 405,
            Status::NotAcceptable        => 406,
            Status::Conflict             => 409,
            Status::Gone                 => 410,
            Status::PreconditionFailed   => 412,
            Status::UnprocessableContent => 422,
            Status::TooManyRequests      => 429,
            Status::InternalServerError  => 500,
            Status::NotImplemented       => 501,
            Status::BadGateway           => 502,
            Status::ServiceUnavailable   => 503,
            Status::GatewayTimeout       => 504,
        }
    }
}

/// Canonical reason phrase for `code` (`404` → `"Not Found"`).
///
/// Unregistered codes yield an empty string.
pub(crate) fn reason_phrase(code: u16) -> &'static str {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
