//! hyper-backed server with graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the accept loop stops, in-flight connections are
//! drained, and [`Server::serve`] returns. Each request is translated into a
//! [`Request`], run through the [`Router`] (and so through every layer,
//! including [`AgentContext`](crate::AgentContext)), and translated back.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Binds to `addr` once [`serve`](Server::serve) is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string. Use
    /// [`from_config`](Server::from_config) to handle that as an error.
    ///
    /// ```rust,no_run
    /// let server = hac::Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Self { addr: config.listen }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts connections until a shutdown signal, then drains them.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        info!(addr = %self.addr, "hac listening");

        let mut tasks = JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown wins over queued connections
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tasks.spawn(serve_connection(stream, peer, Arc::clone(&router)));
                    }
                    Err(e) => error!("accept error: {e}"),
                },

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("hac stopped");
        Ok(())
    }
}

/// HTTP/1.1 or HTTP/2, whichever the client speaks, until it hangs up.
async fn serve_connection(stream: TcpStream, peer: SocketAddr, router: Arc<Router>) {
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(dispatch(&router, req).await) }
    });

    let conn = ConnBuilder::new(TokioExecutor::new());
    if let Err(e) = conn.serve_connection(TokioIo::new(stream), svc).await {
        error!(%peer, "connection error: {e}");
    }
}

/// One hyper request in, one response out. Failures become statuses.
async fn dispatch(router: &Router, req: hyper::Request<Incoming>) -> http::Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let Ok(method) = Method::try_from(&parts.method) else {
        debug!(method = %parts.method, "unsupported method");
        return Response::status(Status::MethodNotAllowed).into_http();
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Response::status(Status::BadRequest).into_http();
        }
    };

    let headers = parts.headers.iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(v) => Some((name.as_str().to_owned(), v.to_owned())),
            Err(_) => {
                warn!(header = %name, "dropping non-visible-ASCII header value");
                None
            }
        })
        .collect();

    let req = Request::new(method, parts.uri.path().to_owned(), headers, body);
    router.handle(req).await.into_http()
}

/// Resolves on SIGTERM (Unix) or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_listen_address() {
        let config = ServerConfig { listen: "127.0.0.1:8080".parse().unwrap() };
        assert_eq!(Server::from_config(config).addr().port(), 8080);
    }

    #[test]
    #[should_panic(expected = "invalid socket address")]
    fn bind_rejects_garbage() {
        let _ = Server::bind("not an address");
    }
}
