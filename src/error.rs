//! Unified error type.

/// The error type returned by hac's fallible operations.
///
/// Application-level outcomes (404, 406, error envelopes, etc.) are expressed
/// as HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// surfaces infrastructure failures: a bad listen address, binding to a port,
/// or accepting a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding or accepting on the listener failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The configured listen address is not a valid `host:port`.
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}
