//! Transport using hyper-util with connection pooling and rustls.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::{
    Error, Headers, Method, ProgressHandler, Request, Response, Result, Transport,
    TransportErrorKind,
};

/// Settings of the hyper connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HyperTransportConfig {
    /// Upper bound for a whole exchange, body included.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for HyperTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl HyperTransportConfig {
    /// Set the exchange timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = count;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }
}

fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// HTTP/1.1 and HTTP/2 transport over hyper-util.
///
/// The body is streamed frame by frame: progress is first reported once the
/// headers arrive, with the announced `Content-Length` if any, then after
/// every data frame. A failing progress handler aborts the download.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: HyperTransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(HyperTransportConfig::default())
    }
}

impl HyperTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new(config: HyperTransportConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config.connect_timeout));
        Self { client, config }
    }

    /// Transport settings.
    #[must_use]
    pub const fn config(&self) -> &HyperTransportConfig {
        &self.config
    }

    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body, _) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());
        for item in &headers {
            builder = builder.header(item.name(), item.value());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|err| Error::invalid_request(err.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
            .collect()
    }

    fn content_length(method: Method, headers: &http::HeaderMap) -> Option<u64> {
        if method == Method::Head {
            return None;
        }
        headers
            .get(http::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let message = err.to_string();
        let detail = std::error::Error::source(&err).map_or_else(String::new, ToString::to_string);
        let lowered = format!("{message} {detail}").to_ascii_lowercase();

        let kind = if lowered.contains("tls") || lowered.contains("certificate") {
            TransportErrorKind::Tls
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        if detail.is_empty() {
            Error::transport(kind, message)
        } else {
            Error::transport(kind, format!("{message}: {detail}"))
        }
    }

    async fn exchange(&self, request: Request, progress: Option<ProgressHandler>) -> Result<Response> {
        let method = request.method();
        let hyper_request = Self::build_hyper_request(request)?;

        let response = self
            .client
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let expected = Self::content_length(method, response.headers());
        debug!(status, ?expected, "response headers received");

        let report = |received: usize| -> Result<()> {
            match &progress {
                Some(progress) => progress(u64::try_from(received).unwrap_or(u64::MAX), expected),
                None => Ok(()),
            }
        };
        report(0)?;

        let mut body = response.into_body();
        let mut buffer = BytesMut::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|err| Error::transport(TransportErrorKind::Body, err.to_string()))?;
            if let Ok(data) = frame.into_data() {
                buffer.extend_from_slice(&data);
                report(buffer.len())?;
            }
        }

        let response = Response::new(status).with_headers(headers);
        if buffer.is_empty() {
            Ok(response)
        } else {
            Ok(response.with_body(buffer.freeze()))
        }
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: Request, progress: Option<ProgressHandler>) -> Result<Response> {
        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, self.exchange(request, progress))
            .await
            .unwrap_or_else(|_| Err(Error::timeout(format!("no response after {timeout:?}"))))
    }
}
