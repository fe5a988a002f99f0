//! Transports shipped with haul.
//!
//! - [`HyperTransport`] - hyper-util client with rustls, streaming progress
//! - [`ServiceTransport`] - any Tower [`Service`](tower_service::Service)
//!
//! Anything else can be plugged in through [`Transport`](crate::Transport) or
//! [`transport_fn`](crate::transport_fn).

#[cfg(feature = "hyper-transport")]
mod hyper;
mod service;

#[cfg(feature = "hyper-transport")]
pub use self::hyper::{HyperTransport, HyperTransportConfig};
pub use self::service::ServiceTransport;
