//! Error types for haul.
//!
//! The taxonomy separates the reasons a request can fail so callers can react
//! differently: an unhealthy host ([`Error::CircuitBreakerTriggered`]), content
//! that did not validate ([`Error::BadResponseStatusCode`],
//! [`Error::ResponseTooLarge`]), the network itself ([`Error::Transport`]) and
//! the caller giving up ([`Error::Cancelled`]).

use derive_more::{Display, Error, From};

// ============================================================================
// Transport Error
// ============================================================================

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TransportErrorKind {
    /// The connection could not be established.
    #[display("connect")]
    Connect,
    /// The attempt did not complete in time.
    #[display("timeout")]
    Timeout,
    /// TLS handshake or certificate failure.
    #[display("tls")]
    Tls,
    /// The response body could not be read.
    #[display("body")]
    Body,
    /// Any other transport failure.
    #[display("other")]
    Other,
}

/// Failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Create a transport error.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Human readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for haul operations.
#[derive(Debug, Display, Error, From, PartialEq)]
pub enum Error {
    /// The host's circuit breaker is open; the transport was not invoked.
    #[display("circuit breaker triggered")]
    #[from(skip)]
    CircuitBreakerTriggered,

    /// The download exceeded the configured size cap.
    #[display("response too large: {_0} bytes")]
    #[from(skip)]
    ResponseTooLarge(#[error(not(source))] u64),

    /// The final response status is not one of the accepted codes.
    #[display("bad response status code {_0}")]
    #[from(skip)]
    BadResponseStatusCode(#[error(not(source))] u16),

    /// Failure raised by the transport.
    #[display("transport error: {_0}")]
    #[from]
    Transport(TransportError),

    /// The caller cancelled the request.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// The client was shut down while the request waited for a slot.
    #[display("concurrency gate closed")]
    #[from(skip)]
    GateClosed,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "versions.1.0.0").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a transport error of the given kind.
    #[must_use]
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport(TransportError::new(kind, message))
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Connect, message)
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Timeout, message)
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if a failed attempt with this error may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ResponseTooLarge(_))
    }

    /// Returns `true` if this error counts against the host's circuit breaker.
    #[must_use]
    pub const fn is_host_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ResponseTooLarge(_))
    }

    /// Returns `true` if the request was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a transport timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.transport_kind() == Some(TransportErrorKind::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        self.transport_kind() == Some(TransportErrorKind::Connect)
    }

    /// Transport failure category, if this is a transport error.
    #[must_use]
    pub const fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport(error) => Some(error.kind()),
            _ => None,
        }
    }

    /// Rejected status code, if this is a status validation error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadResponseStatusCode(status) => Some(*status),
            _ => None,
        }
    }
}
