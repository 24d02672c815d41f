//! Server configuration.
//!
//! Route metadata is never loaded from here; callers populate the
//! [`Registry`](crate::Registry) in code at startup. This only covers where
//! the host listens.

use std::net::SocketAddr;

use crate::error::Error;

/// Environment variable read by [`ServerConfig::from_env`].
pub const LISTEN_ENV: &str = "HAC_LISTEN";

const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

/// Configuration for [`Server`](crate::Server).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: SocketAddr::from(([0, 0, 0, 0], 3000)) }
    }
}

impl ServerConfig {
    /// Loads configuration from the environment.
    ///
    /// `HAC_LISTEN` overrides the listen address (default `0.0.0.0:3000`).
    /// An unparseable value is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let listen = lookup(LISTEN_ENV).unwrap_or_else(|| DEFAULT_LISTEN.to_owned());
        Ok(Self { listen: listen.trim().parse()? })
    }
}
