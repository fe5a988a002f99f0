//! Exponential backoff retry controller.
//!
//! Retries are attempted when:
//! - the response status is 5xx
//! - the transport failed, or the download exceeded its size cap
//!
//! 4xx responses are never retried; they are only subject to status validation.

use std::time::Duration;

use crate::{Error, Response, RetryStrategy};

/// Decides whether and when to re-issue a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_attempts: u32,
    base_delay: Duration,
}

impl Backoff {
    /// A controller making exactly one attempt.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Controller for an optional strategy.
    #[must_use]
    pub fn from_strategy(strategy: Option<RetryStrategy>) -> Self {
        match strategy {
            Some(RetryStrategy::ExponentialBackoff {
                max_attempts,
                base_delay,
            }) => Self {
                max_attempts: max_attempts.max(1),
                base_delay,
            },
            None => Self::none(),
        }
    }

    /// Total number of attempts allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `true` if the outcome of an attempt warrants another one.
    #[must_use]
    pub fn is_retryable(outcome: &Result<Response, Error>) -> bool {
        match outcome {
            Ok(response) => response.is_server_error(),
            Err(error) => error.is_retryable(),
        }
    }

    /// Delay before the next attempt, given the number of attempts made so far.
    ///
    /// Returns `None` when no attempt remains.
    #[must_use]
    pub fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        if attempts_made == 0 || attempts_made >= self.max_attempts {
            return None;
        }
        let factor = 2_u32.checked_pow(attempts_made - 1).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::none()
    }
}
