//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use haul_core::prelude::*;
//! ```

pub use crate::{
    CancellationToken, Error, Headers, HttpClient, HttpClientExt, Method, ProgressHandler,
    Request, RequestOptions, Response, Result, RetryStrategy, Transport, transport_fn,
};
