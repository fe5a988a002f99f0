//! Client configuration types.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::Headers;

/// Default `User-Agent` value.
pub const DEFAULT_USER_AGENT: &str = concat!("haul/", env!("CARGO_PKG_VERSION"));

/// Per-host circuit breaker policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStrategy {
    /// Number of recent failures that opens the breaker for a host.
    pub max_errors: NonZeroUsize,
    /// How long a failure keeps counting.
    pub age: Duration,
}

impl CircuitBreakerStrategy {
    /// Open a host's breaker once `max_errors` failures happened within `age`.
    ///
    /// A `max_errors` of zero is treated as one.
    #[must_use]
    pub fn host_errors(max_errors: usize, age: Duration) -> Self {
        Self {
            max_errors: NonZeroUsize::new(max_errors).unwrap_or(NonZeroUsize::MIN),
            age,
        }
    }
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Headers added to every request, before the request's own headers.
    pub request_headers: Headers,
    /// Circuit breaker policy; `None` disables the breaker.
    pub circuit_breaker: Option<CircuitBreakerStrategy>,
    /// Maximum simultaneous in-flight requests; `None` is unbounded.
    pub max_concurrent_requests: Option<NonZeroUsize>,
    /// Value of the injected `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_headers: Headers::new(),
            circuit_breaker: None,
            max_concurrent_requests: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    request_headers: Headers,
    circuit_breaker: Option<CircuitBreakerStrategy>,
    max_concurrent_requests: Option<NonZeroUsize>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Add a header sent with every request.
    #[must_use]
    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.add_value(name, value);
        self
    }

    /// Append headers sent with every request.
    #[must_use]
    pub fn request_headers(mut self, headers: &Headers) -> Self {
        self.request_headers.merge(headers);
        self
    }

    /// Set the circuit breaker policy.
    #[must_use]
    pub const fn circuit_breaker(mut self, strategy: CircuitBreakerStrategy) -> Self {
        self.circuit_breaker = Some(strategy);
        self
    }

    /// Set the maximum number of in-flight requests; zero means unbounded.
    #[must_use]
    pub const fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = NonZeroUsize::new(max);
        self
    }

    /// Set the `User-Agent` value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            request_headers: self.request_headers,
            circuit_breaker: self.circuit_breaker,
            max_concurrent_requests: self.max_concurrent_requests,
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert!(config.request_headers.is_empty());
        assert!(config.circuit_breaker.is_none());
        assert!(config.max_concurrent_requests.is_none());
        assert!(config.user_agent.starts_with("haul/"));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .request_header("X-Registry", "main")
            .circuit_breaker(CircuitBreakerStrategy::host_errors(
                5,
                Duration::from_secs(5),
            ))
            .max_concurrent_requests(2)
            .user_agent("tool/1.0")
            .build();

        assert_eq!(config.request_headers.first("x-registry"), Some("main"));
        assert_eq!(
            config.circuit_breaker.map(|strategy| strategy.max_errors.get()),
            Some(5)
        );
        assert_eq!(config.max_concurrent_requests.map(NonZeroUsize::get), Some(2));
        assert_eq!(config.user_agent, "tool/1.0");
    }

    #[test]
    fn zero_limits_are_normalized() {
        let config = ClientConfig::builder().max_concurrent_requests(0).build();
        assert!(config.max_concurrent_requests.is_none());

        let strategy = CircuitBreakerStrategy::host_errors(0, Duration::from_secs(1));
        assert_eq!(strategy.max_errors.get(), 1);
    }
}
