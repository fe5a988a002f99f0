//! Tower service adapter.

use tower::ServiceExt;
use tower_service::Service;

use crate::{Error, ProgressHandler, Request, Response, Result, Transport};

/// Transport delegating every exchange to a Tower service.
///
/// Useful to put Tower layers below the engine or to reuse an existing
/// service stack. The service is cloned for each exchange. Progress is not
/// reported, so size caps are only enforced on the final body.
///
/// # Example
///
/// ```ignore
/// use haul::{Client, ClientConfig, Response, ServiceTransport};
///
/// let service = tower::service_fn(|_request| async { Ok(Response::ok()) });
/// let client = Client::with_transport(ClientConfig::default(), ServiceTransport::new(service));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceTransport<S> {
    service: S,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    /// Wrapped service.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.service
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    async fn send(&self, request: Request, _progress: Option<ProgressHandler>) -> Result<Response> {
        self.service.clone().oneshot(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::check;
    use tower::ServiceBuilder;
    use url::Url;

    use super::*;
    use crate::{Client, ClientConfig, HttpClient, Method};

    fn request() -> Request {
        Request::new(
            Method::Get,
            Url::parse("http://localhost/status").expect("url"),
        )
    }

    #[tokio::test]
    async fn forwards_to_service() {
        let service = tower::service_fn(|request: Request| async move {
            Ok::<_, Error>(Response::ok().with_body(request.url().path().to_string()))
        });
        let transport = ServiceTransport::new(service);

        let response = transport.send(request(), None).await.expect("response");
        check!(response.text().expect("utf-8") == "/status");
    }

    #[tokio::test]
    async fn layers_run_below_the_engine() {
        let seen = Arc::new(AtomicUsize::new(0));
        let service = {
            let seen = Arc::clone(&seen);
            ServiceBuilder::new()
                .map_request(move |request: Request| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    request
                })
                .service_fn(|_: Request| async { Ok::<_, Error>(Response::new(201)) })
        };
        let client = Client::with_transport(ClientConfig::default(), ServiceTransport::new(service));

        let response = client.execute(request()).await.expect("response");

        check!(response.status() == 201);
        check!(seen.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn body_cap_applies_without_progress() {
        let service =
            tower::service_fn(|_: Request| async { Ok::<_, Error>(Response::ok().with_body("0123456789")) });
        let client = Client::with_transport(ClientConfig::default(), ServiceTransport::new(service));
        let mut request = request();
        request.options_mut().maximum_response_size_in_bytes = Some(4);

        let result = client.execute(request).await;
        check!(result == Err(Error::ResponseTooLarge(10)));
    }
}
