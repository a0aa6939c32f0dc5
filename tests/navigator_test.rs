//! Integration tests for the HTTP navigator

mod common;

use common::test_config;
use std::time::{Duration, Instant};
use vigil::error::VigilError;
use vigil::navigator::{HttpNavigator, Navigate};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn navigate_extracts_page_structure() {
    let mock_server = MockServer::start().await;

    let html = r#"<html><head><title>Demo Shop</title></head><body>
        <h1>Welcome</h1>
        <a href="/products">Products</a>
        <a href="/about">About</a>
        <form action="/search" method="get"><input type="text" name="q"></form>
        <script>console.log("hi");</script>
        <!-- staging server -->
        </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&mock_server)
        .await;

    let config = test_config();
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");

    let context = navigator
        .navigate_to(&format!("{}/", mock_server.uri()))
        .await
        .expect("navigation failed");

    assert_eq!(context.title, "Demo Shop");
    assert!(context.text.contains("Welcome"));
    assert_eq!(
        context
            .links
            .iter()
            .filter(|l| l.ends_with("/products") || l.ends_with("/about"))
            .count(),
        2
    );
    assert_eq!(context.forms.len(), 1);
    assert_eq!(context.forms[0].fields[0].name, "q");
    assert_eq!(context.scripts.len(), 1);
    assert_eq!(context.comments, vec!["staging server".to_string()]);
}

#[tokio::test]
async fn navigation_times_out_within_configured_bound() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.navigator.timeout = 500;
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");

    let start = Instant::now();
    let result = navigator.navigate_to(&mock_server.uri()).await;
    let elapsed = start.elapsed();

    match result {
        Err(VigilError::NavigationTimeout { timeout_ms, .. }) => {
            assert_eq!(timeout_ms, 500);
        }
        other => panic!("expected NavigationTimeout, got {other:?}"),
    }
    // Approximately the configured bound, with slack for slow CI
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn stalled_body_read_is_a_timeout_error() {
    use tokio::io::AsyncWriteExt;

    // Server sends headers promptly, then never delivers the body
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 1000\r\n\r\n<html>",
            )
            .await
            .expect("write");
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let mut config = test_config();
    config.navigator.timeout = 500;
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");

    let result = navigator.navigate_to(&format!("http://{addr}/")).await;
    match result {
        Err(VigilError::NavigationTimeout { timeout_ms, .. }) => {
            assert_eq!(timeout_ms, 500);
        }
        other => panic!("expected NavigationTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn navigation_to_unreachable_host_fails() {
    let config = test_config();
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");

    // Reserved TEST-NET-1 address, nothing listens there
    let result = navigator.navigate_to("http://192.0.2.1:9/").await;
    assert!(matches!(
        result,
        Err(VigilError::NavigationTimeout { .. }) | Err(VigilError::NavigationError { .. })
    ));
}

#[tokio::test]
async fn error_status_still_yields_page_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("<html><body>stack trace at /var/www/app.php</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let config = test_config();
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");

    let context = navigator
        .navigate_to(&mock_server.uri())
        .await
        .expect("error pages are still analyzable");
    assert!(context.text.contains("stack trace"));
}

#[tokio::test]
async fn close_is_idempotent() {
    let config = test_config();
    let navigator = HttpNavigator::from_config(&config.navigator).expect("client");
    navigator.close().await.expect("close");
    navigator.close().await.expect("second close");
}
