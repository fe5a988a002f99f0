//! Download size enforcement.
//!
//! The transport's progress notifications are checked against the request's
//! `maximum_response_size_in_bytes`. The first violation is remembered so that
//! the attempt fails even when a transport ignores the progress error.

use std::sync::{Arc, OnceLock};

use crate::{Error, ProgressHandler, Response, Result};

/// Size guard for a single attempt.
#[derive(Clone)]
pub struct SizeLimit {
    max: Option<u64>,
    exceeded: Arc<OnceLock<u64>>,
    forward: Option<ProgressHandler>,
}

impl std::fmt::Debug for SizeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeLimit")
            .field("max", &self.max)
            .field("exceeded", &self.exceeded.get())
            .field("forward", &self.forward.is_some())
            .finish()
    }
}

impl SizeLimit {
    /// Guard enforcing `max`, forwarding accepted notifications to `forward`.
    #[must_use]
    pub fn new(max: Option<u64>, forward: Option<ProgressHandler>) -> Self {
        Self {
            max,
            exceeded: Arc::new(OnceLock::new()),
            forward,
        }
    }

    /// Check a progress notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResponseTooLarge`] with the offending byte count when
    /// either quantity is above the cap, or the forwarded handler's error.
    pub fn check(&self, received: u64, expected: Option<u64>) -> Result<()> {
        if let Some(max) = self.max {
            let offending = if received > max {
                Some(received)
            } else {
                expected.filter(|total| *total > max)
            };
            if let Some(bytes) = offending {
                let bytes = *self.exceeded.get_or_init(|| bytes);
                return Err(Error::ResponseTooLarge(bytes));
            }
        }
        match &self.forward {
            Some(forward) => forward(received, expected),
            None => Ok(()),
        }
    }

    /// Progress handler to hand to the transport, `None` when there is
    /// nothing to enforce or forward.
    #[must_use]
    pub fn handler(&self) -> Option<ProgressHandler> {
        if self.max.is_none() && self.forward.is_none() {
            return None;
        }
        let guard = self.clone();
        Some(Arc::new(move |received: u64, expected: Option<u64>| {
            guard.check(received, expected)
        }))
    }

    /// Reconcile the transport's result with what the guard observed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResponseTooLarge`] if a violation was seen during the
    /// transfer, or if the final body is larger than the cap.
    pub fn finish(&self, result: Result<Response>) -> Result<Response> {
        if let Some(bytes) = self.exceeded.get() {
            return Err(Error::ResponseTooLarge(*bytes));
        }
        let response = result?;
        let length = u64::try_from(response.body_len()).unwrap_or(u64::MAX);
        match self.max {
            Some(max) if length > max => Err(Error::ResponseTooLarge(length)),
            _ => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn no_limit_no_forward_has_no_handler() {
        assert!(SizeLimit::new(None, None).handler().is_none());
    }

    #[test]
    fn received_above_cap() {
        let limit = SizeLimit::new(Some(10), None);
        let handler = limit.handler().expect("handler");

        assert_eq!(handler(5, None), Ok(()));
        assert_eq!(handler(10, Some(10)), Ok(()));
        assert_eq!(handler(100, None), Err(Error::ResponseTooLarge(100)));
    }

    #[test]
    fn expected_above_cap() {
        let limit = SizeLimit::new(Some(10), None);
        assert_eq!(limit.check(0, Some(50)), Err(Error::ResponseTooLarge(50)));
    }

    #[test]
    fn violation_overrides_transport_result() {
        let limit = SizeLimit::new(Some(10), None);
        let _ = limit.check(100, None);

        let result = limit.finish(Ok(Response::ok()));
        assert_eq!(result, Err(Error::ResponseTooLarge(100)));
    }

    #[test]
    fn body_checked_without_progress() {
        let limit = SizeLimit::new(Some(4), None);
        assert_eq!(
            limit.finish(Ok(Response::ok().with_body("12345"))),
            Err(Error::ResponseTooLarge(5))
        );

        let limit = SizeLimit::new(Some(5), None);
        assert!(limit.finish(Ok(Response::ok().with_body("12345"))).is_ok());
    }

    #[test]
    fn transport_error_passes_through() {
        let limit = SizeLimit::new(Some(4), None);
        assert_eq!(
            limit.finish(Err(Error::connection("reset"))),
            Err(Error::connection("reset"))
        );
    }

    #[test]
    fn forwards_accepted_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let forward: ProgressHandler = {
            let seen = Arc::clone(&seen);
            Arc::new(move |received: u64, expected: Option<u64>| {
                seen.lock().expect("lock").push((received, expected));
                Ok(())
            })
        };
        let limit = SizeLimit::new(Some(10), Some(forward));

        let _ = limit.check(4, Some(8));
        let _ = limit.check(8, Some(8));
        let _ = limit.check(20, Some(8));

        assert_eq!(*seen.lock().expect("lock"), vec![(4, Some(8)), (8, Some(8))]);
    }
}
