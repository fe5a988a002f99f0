//! Metrics hooks, recorded through the `metrics` crate facade when the
//! `metrics` feature is enabled and compiled out otherwise.
//!
//! - `haul_requests_total` (counter): finished requests, by method and outcome
//! - `haul_retries_total` (counter): retried attempts, by method
//! - `haul_circuit_breaker_rejections_total` (counter): requests rejected by an open breaker
//! - `haul_requests_in_flight` (gauge): attempts currently holding a gate slot

use crate::{Error, Method, Response};

#[cfg(feature = "metrics")]
const LABEL_METHOD: &str = "method";
#[cfg(feature = "metrics")]
const LABEL_OUTCOME: &str = "outcome";

#[cfg(feature = "metrics")]
const METRIC_REQUESTS_TOTAL: &str = "haul_requests_total";
#[cfg(feature = "metrics")]
const METRIC_RETRIES_TOTAL: &str = "haul_retries_total";
#[cfg(feature = "metrics")]
const METRIC_BREAKER_REJECTIONS: &str = "haul_circuit_breaker_rejections_total";
#[cfg(feature = "metrics")]
const METRIC_REQUESTS_IN_FLIGHT: &str = "haul_requests_in_flight";

/// Short label describing how a request ended.
pub(crate) fn outcome_label(result: &Result<Response, Error>) -> String {
    match result {
        Ok(response) => response.status().to_string(),
        Err(Error::CircuitBreakerTriggered) => "circuit_open".to_string(),
        Err(Error::ResponseTooLarge(_)) => "too_large".to_string(),
        Err(Error::BadResponseStatusCode(status)) => format!("rejected_{status}"),
        Err(Error::Cancelled) => "cancelled".to_string(),
        Err(_) => "error".to_string(),
    }
}

pub(crate) fn request_finished(method: Method, outcome: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(
        METRIC_REQUESTS_TOTAL,
        LABEL_METHOD => method.to_string(),
        LABEL_OUTCOME => outcome.to_string()
    )
    .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = (method, outcome);
}

pub(crate) fn retry_scheduled(method: Method) {
    #[cfg(feature = "metrics")]
    metrics::counter!(METRIC_RETRIES_TOTAL, LABEL_METHOD => method.to_string()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = method;
}

pub(crate) fn breaker_rejected() {
    #[cfg(feature = "metrics")]
    metrics::counter!(METRIC_BREAKER_REJECTIONS).increment(1);
}

/// Keeps the in-flight gauge raised while alive.
pub(crate) struct InFlight(());

impl InFlight {
    pub(crate) fn enter() -> Self {
        #[cfg(feature = "metrics")]
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);
        Self(())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        #[cfg(feature = "metrics")]
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}
