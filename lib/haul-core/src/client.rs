//! HTTP client traits.
//!
//! - [`HttpClient`] - Executes a [`Request`] through the resilience engine
//! - [`HttpClientExt`] - Method-specific helpers (HEAD/GET/POST/PUT/DELETE)

use std::future::Future;

use bytes::Bytes;
use url::Url;

use crate::{Headers, Method, ProgressHandler, Request, RequestOptions, Response, Result};

/// Core HTTP client trait.
pub trait HttpClient: Send + Sync {
    /// Execute a request, reporting download progress to `progress`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host's circuit breaker is open, if the download
    /// is too large, if the transport fails on the last attempt, if the final
    /// status is rejected, or if the request is cancelled.
    fn execute_with_progress(
        &self,
        request: Request,
        progress: Option<ProgressHandler>,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Execute a request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute_with_progress`].
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.execute_with_progress(request, None)
    }
}

fn build(
    method: Method,
    url: &str,
    headers: &Headers,
    body: Option<Bytes>,
    options: RequestOptions,
) -> Result<Request> {
    let url = Url::parse(url)?;
    let builder = Request::builder(method, url).headers(headers).options(options);
    let builder = match body {
        Some(body) => builder.body(body),
        None => builder,
    };
    Ok(builder.build())
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Execute a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn head(
        &self,
        url: &str,
        headers: Headers,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Head, url, &headers, None, options)?;
            self.execute(request).await
        }
    }

    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn get(
        &self,
        url: &str,
        headers: Headers,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Get, url, &headers, None, options)?;
            self.execute(request).await
        }
    }

    /// Execute a GET request reporting download progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn download(
        &self,
        url: &str,
        headers: Headers,
        options: RequestOptions,
        progress: ProgressHandler,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Get, url, &headers, None, options)?;
            self.execute_with_progress(request, Some(progress)).await
        }
    }

    /// Execute a POST request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn post(
        &self,
        url: &str,
        body: Option<Bytes>,
        headers: Headers,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Post, url, &headers, body, options)?;
            self.execute(request).await
        }
    }

    /// Execute a PUT request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn put(
        &self,
        url: &str,
        body: Option<Bytes>,
        headers: Headers,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Put, url, &headers, body, options)?;
            self.execute(request).await
        }
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request fails.
    fn delete(
        &self,
        url: &str,
        headers: Headers,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let request = build(Method::Delete, url, &headers, None, options)?;
            self.execute(request).await
        }
    }
}

// Blanket implementation for all HttpClient implementors
impl<T: HttpClient> HttpClientExt for T {}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert2::{check, let_assert};

    use super::*;
    use crate::Error;

    /// Records requests and answers with the method name as body.
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<Request>>,
    }

    impl Recorder {
        fn last(&self) -> Request {
            self.requests
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request")
        }
    }

    impl HttpClient for Recorder {
        async fn execute_with_progress(
            &self,
            request: Request,
            _progress: Option<ProgressHandler>,
        ) -> Result<Response> {
            let body = request.method().to_string();
            self.requests.lock().expect("lock").push(request);
            Ok(Response::ok().with_body(body))
        }
    }

    fn headers() -> Headers {
        [("X-Test", "value")].into_iter().collect()
    }

    #[tokio::test]
    async fn helpers_use_matching_method() {
        let client = Recorder::default();
        let options = RequestOptions::default;

        client.head("http://test", headers(), options()).await.expect("head");
        check!(client.last().method() == Method::Head);

        client.get("http://test", headers(), options()).await.expect("get");
        check!(client.last().method() == Method::Get);

        client
            .post("http://test", Some(Bytes::from("a")), headers(), options())
            .await
            .expect("post");
        check!(client.last().method() == Method::Post);
        check!(client.last().body() == Some(&Bytes::from("a")));

        client
            .put("http://test", Some(Bytes::from("b")), headers(), options())
            .await
            .expect("put");
        check!(client.last().method() == Method::Put);

        client.delete("http://test", headers(), options()).await.expect("delete");
        check!(client.last().method() == Method::Delete);
        check!(client.last().headers() == &headers());
    }

    #[tokio::test]
    async fn helpers_forward_options() {
        let client = Recorder::default();
        let options = RequestOptions::default().with_valid_response_codes([200]);

        client.get("http://test/a", Headers::new(), options).await.expect("get");

        let request = client.last();
        check!(request.url().as_str() == "http://test/a");
        check!(request.options().valid_response_codes == Some(vec![200]));
    }

    #[tokio::test]
    async fn helpers_reject_invalid_url() {
        let client = Recorder::default();
        let result = client
            .get("not a url", Headers::new(), RequestOptions::default())
            .await;
        let_assert!(Err(Error::InvalidUrl(_)) = result);
    }
}
