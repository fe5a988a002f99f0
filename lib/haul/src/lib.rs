//! Resilient HTTP request execution.
//!
//! haul wraps a [`Transport`] with the machinery needed to talk to flaky
//! package repositories and CDNs:
//! - header preparation: client-wide headers, `User-Agent`, `Authorization`
//! - a per-host circuit breaker whose failures age out over time
//! - exponential backoff retries for 5xx responses and transport failures
//! - a global cap on in-flight requests
//! - download size limits and status code validation
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use haul::prelude::*;
//!
//! let client = Client::with_config(
//!     ClientConfig::builder()
//!         .circuit_breaker(CircuitBreakerStrategy::host_errors(5, Duration::from_secs(60)))
//!         .max_concurrent_requests(16)
//!         .build(),
//! );
//!
//! let options = RequestOptions::default()
//!     .with_retry_strategy(RetryStrategy::exponential_backoff(4, Duration::from_millis(200)))
//!     .with_valid_response_codes([200])
//!     .with_maximum_response_size(10 * 1024 * 1024);
//! let response = client.get("https://example.com/index.json", Headers::new(), options).await?;
//! ```
//!
//! # Features
//!
//! - `hyper-transport` (default): [`HyperTransport`] and [`Client::new`]
//! - `metrics`: request, retry and breaker metrics through the `metrics` facade

mod circuit_breaker;
mod client;
mod config;
mod gate;
pub mod prelude;
mod prepare;
mod retry;
mod size_limit;
mod telemetry;
pub mod transport;

pub use circuit_breaker::{CircuitState, HostCircuitBreaker, HostKey};
pub use client::{Client, ServiceFuture};
pub use config::{CircuitBreakerStrategy, ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use gate::{ConcurrencyGate, GatePermit};
pub use prepare::{AUTHORIZATION, USER_AGENT, prepare};
pub use retry::Backoff;
pub use size_limit::SizeLimit;
#[cfg(feature = "hyper-transport")]
pub use transport::{HyperTransport, HyperTransportConfig};
pub use transport::ServiceTransport;

// Re-export tower for service composition
pub use tower;

// Re-export core types
pub use haul_core::{
    AuthorizationProvider, CancellationToken, Error, HeaderItem, Headers, HttpClient,
    HttpClientExt, Method, ProgressHandler, Request, RequestBuilder, RequestOptions, Response,
    Result, RetryStrategy, Transport, TransportError, TransportErrorKind, TransportFn,
    transport_fn,
};

pub use url;
