//! Handlers and their type-erased storage.
//!
//! Routes, the router fallback, discovery, and nested routers all end up as
//! a [`BoxedHandler`]: an `Arc` around a wrapper that calls the user's
//! function and converts whatever it returns with [`IntoResponse`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe calling interface behind [`BoxedHandler`].
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Anything that can answer a [`Request`].
///
/// Implemented for every `Fn(Request) -> Future<Output = impl IntoResponse>`
/// that is `Send + Sync + 'static`: plain `async fn`s, closures returning
/// `async` blocks, and the handlers returned by
/// [`Discovery::handler`](crate::Discovery::handler) and
/// [`Router::into_handler`](crate::Router::into_handler).
///
/// Sealed.
pub trait Handler: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut, R> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Erased(self))
    }
}

struct Erased<F>(F);

impl<F, Fut, R> ErasedHandler for Erased<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}
