//! Integration tests for `HttpTransport` using wiremock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use timein::metadata::LoginRequest;
use timein::{CookieJar, Error, HttpTransport, RetryStrategy, Transport};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_form() -> LoginRequest {
    LoginRequest::login("login.php", "wizard", "x", false)
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.php"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("password=x"))
        .and(body_string_contains("secure=0"))
        .and(body_string_contains("loginname=wizard"))
        .and(body_string_contains("loggingin=Yup."))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/main.php")
                .insert_header("set-cookie", "PHPSESSID=abc123; path=/"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let exchange = transport.submit(&login_form()).await.unwrap();

    assert_eq!(exchange.status.as_u16(), 302);
    assert_eq!(exchange.redirect_location.as_deref(), Some("/main.php"));
    assert!(exchange.is_redirect());
    assert_eq!(exchange.attempts, 1);
    assert_eq!(
        exchange
            .headers
            .get("set-cookie")
            .and_then(|value| value.to_str().ok()),
        Some("PHPSESSID=abc123; path=/")
    );
}

#[tokio::test]
async fn test_error_page_body_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<b>Bad password</b>"))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let exchange = transport.submit(&login_form()).await.unwrap();

    assert_eq!(exchange.status.as_u16(), 200);
    assert_eq!(exchange.body, "<b>Bad password</b>");
    assert!(exchange.redirect_location.is_none());
}

#[tokio::test]
async fn test_stealth_marker_is_form_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("loginname=wizard%2Fq"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/main.php"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let request = LoginRequest::login("login.php", "wizard", "x", true);
    let exchange = transport.submit(&request).await.unwrap();
    assert!(exchange.is_redirect());
}

#[tokio::test]
async fn test_alternate_server_routing() {
    let default_server = MockServer::start().await;
    let alternate_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/default.php"))
        .mount(&default_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/alternate.php"))
        .mount(&alternate_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(default_server.uri())
        .unwrap()
        .alternate_base_url(alternate_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let exchange = transport
        .submit(&login_form().with_alternate_server(true))
        .await
        .unwrap();
    assert_eq!(exchange.redirect_location.as_deref(), Some("/alternate.php"));

    let exchange = transport.submit(&login_form()).await.unwrap();
    assert_eq!(exchange.redirect_location.as_deref(), Some("/default.php"));
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("user-agent", "timein-test"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/main.php"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .default_header("User-Agent", "timein-test")
        .unwrap()
        .build()
        .unwrap();

    transport.submit(&login_form()).await.unwrap();
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First submission hangs past the timeout, second redirects
    Mock::given(method("POST"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            let response = ResponseTemplate::new(302).insert_header("location", "/main.php");
            if count == 0 {
                response.set_delay(Duration::from_secs(2))
            } else {
                response
            }
        })
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(200))
        .retry_strategy(RetryStrategy::Linear {
            delay: Duration::from_millis(10),
            max_retries: 2,
        })
        .build()
        .unwrap();

    let exchange = transport.submit(&login_form()).await.unwrap();

    assert!(exchange.is_redirect());
    assert_eq!(exchange.attempts, 2);
    assert!(exchange.was_retried());
    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/main.php")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(100))
        .retry_strategy(RetryStrategy::Linear {
            delay: Duration::from_millis(10),
            max_retries: 1,
        })
        .build()
        .unwrap();

    let result = transport.submit(&login_form()).await;

    match result {
        Err(Error::MaxRetriesExceeded { attempts, last_error }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last_error, Error::Timeout));
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_without_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(100))
        .retry_strategy(RetryStrategy::None)
        .build()
        .unwrap();

    let result = transport.submit(&login_form()).await;
    assert!(matches!(result, Err(Error::Timeout)), "got {:?}", result);
}

#[tokio::test]
async fn test_server_error_is_returned_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let exchange = transport.submit(&login_form()).await.unwrap();
    assert_eq!(exchange.status.as_u16(), 503);
    assert_eq!(exchange.body, "maintenance");
}

#[tokio::test]
async fn test_cookie_jar_carries_session_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("cookie", "PHPSESSID=abc123"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/main.php"))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/login.php")
                .insert_header("set-cookie", "PHPSESSID=abc123; path=/"),
        )
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let jar = CookieJar::new(mock_server.uri()).unwrap();
    let transport = HttpTransport::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .cookie_jar(&jar)
        .build()
        .unwrap();

    let first = transport.submit(&login_form()).await.unwrap();
    assert_eq!(first.redirect_location.as_deref(), Some("/login.php"));
    assert_eq!(jar.get("PHPSESSID").as_deref(), Some("abc123"));

    let second = transport.submit(&login_form()).await.unwrap();
    assert_eq!(second.redirect_location.as_deref(), Some("/main.php"));
}
