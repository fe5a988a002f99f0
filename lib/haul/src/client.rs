//! Request engine.
//!
//! Every request goes through the same pipeline:
//! 1. header preparation (configuration headers, `User-Agent`, `Authorization`)
//! 2. per-host circuit breaker check, before each attempt
//! 3. concurrency gate, held for the duration of one attempt
//! 4. the transport, with size enforcement and optional per-attempt timeout
//! 5. failure accounting, exponential backoff and final status validation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::time::Instant;
use tower_service::Service;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use crate::circuit_breaker::{CircuitState, HostCircuitBreaker, HostKey};
use crate::gate::ConcurrencyGate;
use crate::prepare::prepare;
use crate::retry::Backoff;
use crate::size_limit::SizeLimit;
use crate::telemetry::{self, InFlight};
use crate::{
    CancellationToken, ClientConfig, Error, HttpClient, ProgressHandler, Request, RequestOptions,
    Response, Result, Transport,
};

#[cfg(feature = "hyper-transport")]
use crate::transport::{HyperTransport, HyperTransportConfig};

/// Future type for the Tower [`Service`] implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

struct Inner<T> {
    config: ClientConfig,
    transport: T,
    breaker: HostCircuitBreaker,
    gate: ConcurrencyGate,
}

/// Resilient HTTP client.
///
/// Cloning is cheap: clones share the transport, the circuit breaker history
/// and the concurrency gate.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use haul::prelude::*;
///
/// let config = ClientConfig::builder()
///     .circuit_breaker(CircuitBreakerStrategy::host_errors(5, Duration::from_secs(30)))
///     .max_concurrent_requests(8)
///     .build();
/// let client = Client::with_config(config);
///
/// let options = RequestOptions::default()
///     .with_retry_strategy(RetryStrategy::exponential_backoff(3, Duration::from_millis(100)))
///     .with_valid_response_codes([200]);
/// let response = client.get("https://example.com/index.json", Headers::new(), options).await?;
/// ```
pub struct Client<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("gate", &self.inner.gate)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "hyper-transport")]
impl Client<HyperTransport> {
    /// Create a client with default configuration over the hyper transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client over the hyper transport with default transport settings.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, HyperTransport::new(HyperTransportConfig::default()))
    }
}

#[cfg(feature = "hyper-transport")]
impl Default for Client<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Create a client sending its requests through `transport`.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let breaker = HostCircuitBreaker::new(config.circuit_breaker);
        let gate = ConcurrencyGate::new(config.max_concurrent_requests);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                breaker,
                gate,
            }),
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Concurrency gate shared by all clones of this client.
    #[must_use]
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.inner.gate
    }

    /// Breaker state of the host serving `url`.
    #[must_use]
    pub fn circuit_state(&self, url: &Url) -> CircuitState {
        self.inner.breaker.state(&HostKey::from_url(url))
    }

    /// Stop admitting requests.
    ///
    /// Requests waiting for a slot, and every later request, fail with
    /// [`Error::GateClosed`]. Attempts already holding a slot run to completion.
    pub fn shutdown(&self) {
        debug!("shutting down client");
        self.inner.gate.close();
    }

    async fn run(&self, request: Request, progress: Option<ProgressHandler>) -> Result<Response> {
        let inner = &*self.inner;
        let request = prepare(&inner.config, request);
        let host = HostKey::from_url(request.url());
        let backoff = Backoff::from_strategy(request.options().retry_strategy);
        let cancellation = request.options().cancellation.clone();

        let mut attempts = 0;
        loop {
            if inner.breaker.is_open(&host) {
                warn!(%host, "circuit breaker open, request rejected");
                telemetry::breaker_rejected();
                return Err(Error::CircuitBreakerTriggered);
            }

            attempts += 1;
            debug!(attempt = attempts, %host, "sending request");
            let outcome = self
                .attempt(&request, progress.clone(), cancellation.as_ref())
                .await;
            if matches!(outcome, Err(Error::Cancelled | Error::GateClosed)) {
                return outcome;
            }

            if is_host_failure(&outcome) {
                inner.breaker.record_failure(&host);
            }

            if Backoff::is_retryable(&outcome)
                && let Some(delay) = backoff.next_delay(attempts)
            {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                match &outcome {
                    Ok(response) => {
                        warn!(attempt = attempts, status = response.status(), delay_ms, "retrying request");
                    }
                    Err(err) => warn!(attempt = attempts, error = %err, delay_ms, "retrying request"),
                }
                telemetry::retry_scheduled(request.method());
                until_cancelled(cancellation.as_ref(), tokio::time::sleep(delay)).await?;
                continue;
            }

            return validate(request.options(), outcome);
        }
    }

    async fn attempt(
        &self,
        request: &Request,
        progress: Option<ProgressHandler>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Response> {
        let inner = &*self.inner;
        let _permit = until_cancelled(cancellation, inner.gate.acquire()).await??;
        let _in_flight = InFlight::enter();

        let limit = SizeLimit::new(request.options().maximum_response_size_in_bytes, progress);
        let send = inner.transport.send(request.clone(), limit.handler());
        let exchange = async {
            match request.options().timeout {
                Some(timeout) => tokio::time::timeout(timeout, send)
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::timeout(format!("no response after {timeout:?}")))
                    }),
                None => send.await,
            }
        };

        let result = until_cancelled(cancellation, exchange).await?;
        limit.finish(result)
    }
}

impl<T: Transport> HttpClient for Client<T> {
    fn execute_with_progress(
        &self,
        request: Request,
        progress: Option<ProgressHandler>,
    ) -> impl Future<Output = Result<Response>> + Send {
        let method = request.method();
        let url = request.url().to_string();
        let span = info_span!("http_request", %method, %url);
        let client = self.clone();

        async move {
            let start = Instant::now();
            let result = client.run(request, progress).await;
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(response) => info!(status = response.status(), elapsed_ms, "request completed"),
                Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
            }
            telemetry::request_finished(method, &telemetry::outcome_label(&result));
            result
        }
        .instrument(span)
    }
}

impl<T: Transport> Service<Request> for Client<T> {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

/// Failures that count against the host: 5xx responses, transport errors and
/// oversized downloads.
fn is_host_failure(outcome: &Result<Response>) -> bool {
    match outcome {
        Ok(response) => response.is_server_error(),
        Err(err) => err.is_host_failure(),
    }
}

fn validate(options: &RequestOptions, outcome: Result<Response>) -> Result<Response> {
    let response = outcome?;
    if options.accepts_status(response.status()) {
        Ok(response)
    } else {
        Err(Error::BadResponseStatusCode(response.status()))
    }
}

async fn until_cancelled<F: Future>(
    token: Option<&CancellationToken>,
    future: F,
) -> Result<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}
