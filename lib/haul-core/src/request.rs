//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, a body and
//! per-request [`RequestOptions`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use haul_core::{Method, Request, RequestOptions, RetryStrategy};
//!
//! let options = RequestOptions::default()
//!     .with_retry_strategy(RetryStrategy::exponential_backoff(3, Duration::from_millis(50)))
//!     .with_valid_response_codes([200]);
//!
//! let request = Request::builder(Method::Get, "https://registry.example.com/index".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .options(options)
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::{CancellationToken, Headers, Method};

/// Produces the `Authorization` header value for a URL, if any.
pub type AuthorizationProvider = Arc<dyn Fn(&Url) -> Option<String> + Send + Sync>;

/// How failed attempts are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Retry with a delay of `base_delay * 2^(attempt - 1)` between attempts.
    ExponentialBackoff {
        /// Total number of attempts, including the first one.
        max_attempts: u32,
        /// Delay before the first retry.
        base_delay: Duration,
    },
}

impl RetryStrategy {
    /// Exponential backoff strategy.
    #[must_use]
    pub const fn exponential_backoff(max_attempts: u32, base_delay: Duration) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            base_delay,
        }
    }
}

/// Per-request behaviour of the engine.
#[derive(Clone)]
pub struct RequestOptions {
    /// Retry policy; `None` makes exactly one attempt.
    pub retry_strategy: Option<RetryStrategy>,
    /// Accepted status codes; `None` disables status validation.
    pub valid_response_codes: Option<Vec<u16>>,
    /// Download size cap in bytes.
    pub maximum_response_size_in_bytes: Option<u64>,
    /// Whether a `User-Agent` header is added.
    pub add_user_agent: bool,
    /// Source of the `Authorization` header value.
    pub authorization_provider: Option<AuthorizationProvider>,
    /// Deadline for each individual attempt.
    pub timeout: Option<Duration>,
    /// Token the caller may use to abandon the request.
    pub cancellation: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            retry_strategy: None,
            valid_response_codes: None,
            maximum_response_size_in_bytes: None,
            add_user_agent: true,
            authorization_provider: None,
            timeout: None,
            cancellation: None,
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("retry_strategy", &self.retry_strategy)
            .field("valid_response_codes", &self.valid_response_codes)
            .field(
                "maximum_response_size_in_bytes",
                &self.maximum_response_size_in_bytes,
            )
            .field("add_user_agent", &self.add_user_agent)
            .field(
                "authorization_provider",
                &self.authorization_provider.is_some(),
            )
            .field("timeout", &self.timeout)
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

impl RequestOptions {
    /// Set the retry strategy.
    #[must_use]
    pub const fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Set the accepted status codes.
    #[must_use]
    pub fn with_valid_response_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.valid_response_codes = Some(codes.into_iter().collect());
        self
    }

    /// Set the download size cap.
    #[must_use]
    pub const fn with_maximum_response_size(mut self, bytes: u64) -> Self {
        self.maximum_response_size_in_bytes = Some(bytes);
        self
    }

    /// Set whether a `User-Agent` header is added.
    #[must_use]
    pub const fn with_user_agent(mut self, add: bool) -> Self {
        self.add_user_agent = add;
        self
    }

    /// Set the authorization provider.
    #[must_use]
    pub fn with_authorization_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Url) -> Option<String> + Send + Sync + 'static,
    {
        self.authorization_provider = Some(Arc::new(provider));
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns `true` if `status` passes validation.
    #[must_use]
    pub fn accepts_status(&self, status: u16) -> bool {
        self.valid_response_codes
            .as_ref()
            .is_none_or(|codes| codes.contains(&status))
    }
}

/// An HTTP request with method, URL, headers, optional body and options.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
    options: RequestOptions,
}

impl Request {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        RequestBuilder::new(method, url).build()
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Request options.
    #[must_use]
    pub const fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Mutable access to options.
    #[must_use]
    pub fn options_mut(&mut self) -> &mut RequestOptions {
        &mut self.options
    }

    /// Consume into (method, url, headers, body, options).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Headers, Option<Bytes>, RequestOptions) {
        (self.method, self.url, self.headers, self.body, self.options)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
    options: RequestOptions,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add_value(name, value);
        self
    }

    /// Appends a whole header collection.
    #[must_use]
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.merge(headers);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request options.
    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://registry.example.com/packages").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::Get, url())
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://registry.example.com/packages");
        assert_eq!(request.headers().first("accept"), Some("application/json"));
        assert!(request.body().is_none());
        assert!(request.options().add_user_agent);
    }

    #[test]
    fn request_builder_with_body() {
        let request = Request::builder(Method::Put, url())
            .body("payload")
            .build();

        assert_eq!(request.method(), Method::Put);
        assert_eq!(request.body(), Some(&Bytes::from("payload")));
    }

    #[test]
    fn request_builder_merges_headers() {
        let extra: Headers = [("X-One", "1"), ("X-Two", "2")].into_iter().collect();
        let request = Request::builder(Method::Delete, url())
            .header("X-Zero", "0")
            .headers(&extra)
            .build();

        assert_eq!(request.headers().len(), 3);
    }

    #[test]
    fn options_builder() {
        let options = RequestOptions::default()
            .with_retry_strategy(RetryStrategy::exponential_backoff(
                5,
                Duration::from_millis(100),
            ))
            .with_valid_response_codes([200, 204])
            .with_maximum_response_size(1024)
            .with_user_agent(false)
            .with_timeout(Duration::from_secs(3))
            .with_authorization_provider(|_| Some("token".to_string()));

        assert_eq!(
            options.retry_strategy,
            Some(RetryStrategy::ExponentialBackoff {
                max_attempts: 5,
                base_delay: Duration::from_millis(100),
            })
        );
        assert_eq!(options.valid_response_codes, Some(vec![200, 204]));
        assert_eq!(options.maximum_response_size_in_bytes, Some(1024));
        assert!(!options.add_user_agent);
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
        assert!(options.authorization_provider.is_some());
    }

    #[test]
    fn options_accepts_status() {
        let options = RequestOptions::default();
        assert!(options.accepts_status(404));

        let options = options.with_valid_response_codes([200]);
        assert!(options.accepts_status(200));
        assert!(!options.accepts_status(404));
    }

    #[test]
    fn options_debug_hides_provider() {
        let options = RequestOptions::default().with_authorization_provider(|_| None);
        let debug = format!("{options:?}");
        assert!(debug.contains("authorization_provider: true"));
    }
}
