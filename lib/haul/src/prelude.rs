//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy glob importing:
//!
//! ```ignore
//! use haul::prelude::*;
//! ```

pub use crate::{
    CancellationToken, CircuitBreakerStrategy, CircuitState, Client, ClientConfig, Error,
    HeaderItem, Headers, HttpClient, HttpClientExt, Method, ProgressHandler, Request,
    RequestOptions, Response, Result, RetryStrategy, Transport, transport_fn,
};

#[cfg(feature = "hyper-transport")]
pub use crate::{HyperTransport, HyperTransportConfig};
