//! Integration tests for the hyper transport using wiremock.

#![cfg(feature = "hyper-transport")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use haul::prelude::*;
use haul::{DEFAULT_USER_AGENT, TransportErrorKind};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, header_exists, method, path},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Package {
    name: String,
    version: String,
}

fn package() -> Package {
    Package {
        name: "zlib".to_string(),
        version: "1.3.1".to_string(),
    }
}

#[tokio::test]
async fn test_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages/zlib"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(package()))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let headers: Headers = [("Accept", "application/json")].into_iter().collect();
    let response = client
        .get(
            &format!("{}/packages/zlib", mock_server.uri()),
            headers,
            RequestOptions::default().with_valid_response_codes([200]),
        )
        .await
        .expect("response");

    assert!(response.is_success());
    let body: Package = response.json().expect("json");
    assert_eq!(body, package());
}

#[tokio::test]
async fn test_post_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response = client
        .post(
            &format!("{}/upload", mock_server.uri()),
            Some("payload".into()),
            Headers::new(),
            RequestOptions::default(),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), 201);
    assert!(response.body().is_none());
}

#[tokio::test]
async fn test_head_has_no_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/repodata.json"))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"abc\""))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response = client
        .head(
            &format!("{}/repodata.json", mock_server.uri()),
            Headers::new(),
            RequestOptions::default().with_maximum_response_size(1),
        )
        .await
        .expect("response");

    assert_eq!(response.header("etag"), Some("\"abc\""));
    assert_eq!(response.body_len(), 0);
}

#[tokio::test]
async fn test_delete_with_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/packages/zlib"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let options = RequestOptions::default()
        .with_authorization_provider(|_| Some("Bearer secret".to_string()))
        .with_valid_response_codes([204]);
    let response = client
        .delete(&format!("{}/packages/zlib", mock_server.uri()), Headers::new(), options)
        .await
        .expect("response");

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_user_agent_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let response = client
        .get(
            &mock_server.uri(),
            Headers::new(),
            RequestOptions::default().with_user_agent(false),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_retry_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ready"))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let options = RequestOptions::default()
        .with_retry_strategy(RetryStrategy::exponential_backoff(3, Duration::from_millis(10)))
        .with_valid_response_codes([200]);
    let response = client
        .get(&mock_server.uri(), Headers::new(), options)
        .await
        .expect("response");

    assert_eq!(response.text().expect("utf-8"), "ready");
    let received = mock_server.received_requests().await.expect("recording");
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn test_breaker_stops_hitting_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = Client::with_config(
        ClientConfig::builder()
            .circuit_breaker(CircuitBreakerStrategy::host_errors(2, Duration::from_secs(60)))
            .build(),
    );

    for _ in 0..2 {
        let response = client
            .get(&mock_server.uri(), Headers::new(), RequestOptions::default())
            .await
            .expect("response");
        assert_eq!(response.status(), 500);
    }
    let result = client
        .get(&mock_server.uri(), Headers::new(), RequestOptions::default())
        .await;

    assert_eq!(result, Err(Error::CircuitBreakerTriggered));
    let received = mock_server.received_requests().await.expect("recording");
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_announced_size_above_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 1_000]))
        .mount(&mock_server)
        .await;

    let client = Client::new();
    let result = client
        .get(
            &mock_server.uri(),
            Headers::new(),
            RequestOptions::default().with_maximum_response_size(100),
        )
        .await;

    assert_eq!(result, Err(Error::ResponseTooLarge(1_000)));
}

#[tokio::test]
async fn test_download_reports_progress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pkg.tar.bz2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4_096]))
        .mount(&mock_server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let progress: ProgressHandler = {
        let seen = Arc::clone(&seen);
        Arc::new(move |received: u64, expected: Option<u64>| {
            seen.lock().expect("lock").push((received, expected));
            Ok(())
        })
    };

    let client = Client::new();
    let response = client
        .download(
            &format!("{}/pkg.tar.bz2", mock_server.uri()),
            Headers::new(),
            RequestOptions::default().with_maximum_response_size(4_096),
            progress,
        )
        .await
        .expect("response");

    assert_eq!(response.body_len(), 4_096);
    let seen = seen.lock().expect("lock");
    assert_eq!(seen.first(), Some(&(0, Some(4_096))));
    assert_eq!(seen.last(), Some(&(4_096, Some(4_096))));
    assert!(seen.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let client = Client::new();
    let result = client
        .get(&format!("http://{address}/"), Headers::new(), RequestOptions::default())
        .await;

    let Err(Error::Transport(err)) = result else {
        panic!("expected a transport error, got {result:?}");
    };
    assert_eq!(err.kind(), TransportErrorKind::Connect);
}

#[tokio::test]
async fn test_transport_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = Client::with_transport(
        ClientConfig::default(),
        HyperTransport::new(HyperTransportConfig::default().timeout(Duration::from_millis(100))),
    );
    let result = client
        .get(&mock_server.uri(), Headers::new(), RequestOptions::default())
        .await;

    let err = result.expect_err("timeout");
    assert!(err.is_timeout());
}
