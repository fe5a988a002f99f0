//! Per-host circuit breaker with time-based decay.
//!
//! Each host keeps the timestamps of its recent failures. A host is open while
//! at least `max_errors` of them are younger than `age`; older entries are
//! pruned whenever the host is evaluated, so the breaker closes again on its
//! own once failures age out. There is no background timer and no reset on
//! success.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;
use url::Url;

use crate::CircuitBreakerStrategy;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are rejected immediately.
    Open,
}

/// Identity of a host for breaker purposes: scheme, host and explicit port.
///
/// Scheme and host are lowercased; default ports are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey(String);

impl HostKey {
    /// Derive the key of a URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let scheme = url.scheme().to_ascii_lowercase();
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        match url.port() {
            Some(port) => Self(format!("{scheme}://{host}:{port}")),
            None => Self(format!("{scheme}://{host}")),
        }
    }

    /// Key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure history shared by every request of a client.
#[derive(Debug)]
pub struct HostCircuitBreaker {
    strategy: Option<CircuitBreakerStrategy>,
    failures: Mutex<HashMap<HostKey, VecDeque<Instant>>>,
}

impl HostCircuitBreaker {
    /// Create a breaker; `None` disables it.
    #[must_use]
    pub fn new(strategy: Option<CircuitBreakerStrategy>) -> Self {
        Self {
            strategy,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HostKey, VecDeque<Instant>>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of `host`.
    #[must_use]
    pub fn state(&self, host: &HostKey) -> CircuitState {
        self.state_at(host, Instant::now())
    }

    fn state_at(&self, host: &HostKey, now: Instant) -> CircuitState {
        let Some(strategy) = self.strategy else {
            return CircuitState::Closed;
        };
        let mut failures = self.lock();
        if active_failures(&mut failures, host, &strategy, now) >= strategy.max_errors.get() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Returns `true` if requests to `host` must be rejected.
    #[must_use]
    pub fn is_open(&self, host: &HostKey) -> bool {
        self.state(host) == CircuitState::Open
    }

    /// Record a failed attempt against `host`.
    pub fn record_failure(&self, host: &HostKey) {
        self.record_failure_at(host, Instant::now());
    }

    fn record_failure_at(&self, host: &HostKey, now: Instant) {
        let Some(strategy) = self.strategy else {
            return;
        };
        let mut failures = self.lock();
        failures.retain(|_, timestamps| {
            prune(timestamps, &strategy, now);
            !timestamps.is_empty()
        });
        failures.entry(host.clone()).or_default().push_back(now);
    }

    /// Number of failures of `host` still inside the age window.
    #[must_use]
    pub fn failure_count(&self, host: &HostKey) -> usize {
        let Some(strategy) = self.strategy else {
            return 0;
        };
        let mut failures = self.lock();
        active_failures(&mut failures, host, &strategy, Instant::now())
    }
}

/// Drop aged entries of `host` and count what is left.
fn active_failures(
    failures: &mut HashMap<HostKey, VecDeque<Instant>>,
    host: &HostKey,
    strategy: &CircuitBreakerStrategy,
    now: Instant,
) -> usize {
    let Some(timestamps) = failures.get_mut(host) else {
        return 0;
    };
    prune(timestamps, strategy, now);
    let count = timestamps.len();
    if count == 0 {
        failures.remove(host);
    }
    count
}

fn prune(timestamps: &mut VecDeque<Instant>, strategy: &CircuitBreakerStrategy, now: Instant) {
    while timestamps
        .front()
        .is_some_and(|timestamp| now.saturating_duration_since(*timestamp) >= strategy.age)
    {
        timestamps.pop_front();
    }
}
