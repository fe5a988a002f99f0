//! Boundary with the component that performs network I/O.
//!
//! The engine never opens sockets itself: it hands a finalized [`Request`] to a
//! [`Transport`] together with an optional [`ProgressHandler`], and receives a
//! [`Response`] or an [`Error`](crate::Error).

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Download progress callback.
///
/// Called with `(bytes_received, total_bytes_expected)`; the total is `None`
/// when unknown. Returning an error asks the transport to abort the transfer
/// and surface that error.
pub type ProgressHandler = Arc<dyn Fn(u64, Option<u64>) -> Result<()> + Send + Sync>;

/// Performs a single HTTP exchange.
///
/// Implementations must report progress with non-decreasing `bytes_received`,
/// and should stop reading and return the error when the progress handler fails.
pub trait Transport: Send + Sync + 'static {
    /// Send the request and wait for the response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) for network
    /// failures, or the error returned by the progress handler.
    fn send(
        &self,
        request: Request,
        progress: Option<ProgressHandler>,
    ) -> impl Future<Output = Result<Response>> + Send;
}

/// Transport backed by a closure, see [`transport_fn`].
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFn").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`Transport`].
///
/// Handy for tests and for plugging in an existing client.
///
/// # Example
///
/// ```
/// use haul_core::{Request, Response, transport_fn, ProgressHandler};
///
/// let transport = transport_fn(|request: Request, _progress: Option<ProgressHandler>| async move {
///     Ok(Response::ok().with_body(request.url().to_string()))
/// });
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(Request, Option<ProgressHandler>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send,
{
    TransportFn { f }
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(Request, Option<ProgressHandler>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send,
{
    fn send(
        &self,
        request: Request,
        progress: Option<ProgressHandler>,
    ) -> impl Future<Output = Result<Response>> + Send {
        (self.f)(request, progress)
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: Request,
        progress: Option<ProgressHandler>,
    ) -> impl Future<Output = Result<Response>> + Send {
        (**self).send(request, progress)
    }
}
