//! Core types and traits for the haul resilient HTTP client.
//!
//! This crate provides the transport-independent vocabulary used by haul:
//! - [`Method`] - HTTP method enum
//! - [`Headers`] and [`HeaderItem`] - Ordered, case-insensitive multi-value headers
//! - [`Request`], [`RequestBuilder`] and [`RequestOptions`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Error`] and [`Result`] - Error handling
//! - [`Transport`] - Boundary with the component performing network I/O
//! - [`HttpClient`] and [`HttpClientExt`] - Request execution and convenience helpers
//! - [`CancellationToken`] - Cooperative cancellation

mod cancel;
mod client;
mod error;
mod headers;
mod method;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use cancel::CancellationToken;
pub use client::{HttpClient, HttpClientExt};
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use headers::{HeaderItem, Headers};
pub use method::Method;
pub use request::{AuthorizationProvider, Request, RequestBuilder, RequestOptions, RetryStrategy};
pub use response::Response;
pub use transport::{ProgressHandler, Transport, TransportFn, transport_fn};
