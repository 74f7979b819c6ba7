//! End-to-end decisions against a mock identity provider.
//!
//! Each test drives `ForwardAuth::decide` the way the HTTP handler does and checks
//! both the verdict and the exact calls the provider received.

use anyhow::{bail, Result};
use axum_extra::extract::cookie::Cookie;
use basic2fa::forward_auth::{Decision, ForwardAuth, ProviderConfig, Verdict};
use http::{header, HeaderMap, HeaderValue};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header as header_eq, header_exists, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

// alice / hunter2 / 123456
const PACKED: &str = "Basic YWxpY2U6aHVudGVyMjEyMzQ1Ng==";

fn forward_auth(server: &MockServer) -> Result<ForwardAuth> {
    ForwardAuth::from_config(&ProviderConfig::new(server.uri()))
}

fn inbound(authorization: Option<&'static str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, HeaderValue::from_static("app.example.com"));
    headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.7"));
    headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
    headers.insert("x-evil", HeaderValue::from_static("payload"));
    if let Some(value) = authorization {
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
    }
    headers
}

fn ok_status() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "OK"}))
}

fn cookie_value<'v>(verdict: &'v Verdict, name: &str) -> Option<&'v str> {
    verdict
        .cookies
        .iter()
        .find(|cookie| cookie.name() == name)
        .map(Cookie::value)
}

async fn requests(server: &MockServer) -> Result<Vec<Request>> {
    let Some(requests) = server.received_requests().await else {
        bail!("wiremock request recording is disabled");
    };
    Ok(requests)
}

async fn mount_factors_unreachable(server: &MockServer) {
    Mock::given(path("/api/firstfactor"))
        .respond_with(ok_status())
        .expect(0)
        .mount(server)
        .await;
    Mock::given(path("/api/secondfactor/totp"))
        .respond_with(ok_status())
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn valid_session_allows_without_login() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .and(header_eq("cookie", "authelia_session=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("remote-user", "alice")
                .insert_header("remote-email", "alice@example.com"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_factors_unreachable(&server).await;

    let verdict = forward_auth(&server)?
        .decide(
            &inbound(Some(PACKED)),
            [Cookie::new("authelia_session", "abc")],
        )
        .await;

    assert!(matches!(verdict.decision, Decision::Allow));
    assert_eq!(
        verdict.headers.get("remote-user"),
        Some(&HeaderValue::from_static("alice"))
    );
    assert_eq!(
        verdict.headers.get("remote-email"),
        Some(&HeaderValue::from_static("alice@example.com"))
    );

    let received = requests(&server).await?;
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("proxy-authorization").is_none());
    Ok(())
}

#[tokio::test]
async fn accepted_authorization_header_allows_without_login() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .and(header_eq("proxy-authorization", PACKED))
        .respond_with(ResponseTemplate::new(200).insert_header("remote-user", "bob"))
        .expect(1)
        .mount(&server)
        .await;
    mount_factors_unreachable(&server).await;

    let verdict = forward_auth(&server)?
        .decide(&inbound(Some(PACKED)), Vec::new())
        .await;

    assert!(matches!(verdict.decision, Decision::Allow));
    assert_eq!(
        verdict.headers.get("remote-user"),
        Some(&HeaderValue::from_static("bob"))
    );
    Ok(())
}

#[tokio::test]
async fn manual_login_mints_and_relays_session() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .and(header_eq("cookie", "authelia_session=fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("remote-user", "alice")
                .insert_header("remote-groups", "admins"),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firstfactor"))
        .and(body_json(json!({
            "username": "alice",
            "password": "hunter2",
            "keepMeLoggedIn": false
        })))
        .respond_with(ok_status().insert_header("set-cookie", "authelia_session=fresh; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/secondfactor/totp"))
        .and(header_eq("cookie", "authelia_session=fresh"))
        .and(body_json(json!({"token": "123456"})))
        .respond_with(ok_status())
        .expect(1)
        .mount(&server)
        .await;

    let verdict = forward_auth(&server)?
        .decide(
            &inbound(Some(PACKED)),
            [
                Cookie::new("tracking", "xyz"),
                Cookie::new("authelia_session", "stale"),
            ],
        )
        .await;

    assert!(matches!(verdict.decision, Decision::Allow));
    assert_eq!(
        verdict.headers.get("remote-groups"),
        Some(&HeaderValue::from_static("admins"))
    );
    assert_eq!(cookie_value(&verdict, "authelia_session"), Some("fresh"));
    assert_eq!(verdict.cookies.len(), 1);

    let received = requests(&server).await?;
    let paths: Vec<&str> = received.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        [
            "/api/verify",
            "/api/verify",
            "/api/firstfactor",
            "/api/secondfactor/totp",
            "/api/verify",
        ]
    );
    for request in &received {
        assert!(request.headers.get("x-evil").is_none());
        assert_eq!(
            request
                .headers
                .get("host")
                .and_then(|v| v.to_str().ok()),
            Some("app.example.com")
        );
        let cookie = request
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(!cookie.contains("tracking"));
    }
    Ok(())
}

#[tokio::test]
async fn undecodable_credentials_are_denied() -> Result<()> {
    for authorization in ["Bearer abc.def", "Basic YWxpY2U6MTIzNDU2", "Basic !!!"] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/verify"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_factors_unreachable(&server).await;

        let verdict = forward_auth(&server)?
            .decide(&inbound(Some(authorization)), Vec::new())
            .await;

        assert!(
            matches!(verdict.decision, Decision::Deny),
            "{authorization} should be denied"
        );
        assert!(verdict.headers.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn rejected_first_factor_is_denied() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firstfactor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "KO"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/api/secondfactor/totp"))
        .respond_with(ok_status())
        .expect(0)
        .mount(&server)
        .await;

    let verdict = forward_auth(&server)?
        .decide(&inbound(Some(PACKED)), Vec::new())
        .await;

    assert!(matches!(verdict.decision, Decision::Deny));
    Ok(())
}

#[tokio::test]
async fn malformed_second_factor_keeps_first_factor_cookie() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firstfactor"))
        .respond_with(ok_status().insert_header("set-cookie", "authelia_session=half; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/secondfactor/totp"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let verdict = forward_auth(&server)?
        .decide(&inbound(Some(PACKED)), Vec::new())
        .await;

    let Decision::Error(ref err) = verdict.decision else {
        bail!("expected an error, got {}", verdict.decision.label());
    };
    assert_eq!(err.kind(), "protocol");
    assert_eq!(cookie_value(&verdict, "authelia_session"), Some("half"));
    Ok(())
}

#[tokio::test]
async fn provider_timeout_is_an_error_and_keeps_cookies() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firstfactor"))
        .respond_with(ok_status().insert_header("set-cookie", "authelia_session=half; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/secondfactor/totp"))
        .respond_with(ok_status().set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = ProviderConfig::new(server.uri());
    config.request_timeout = Duration::from_millis(300);
    let verdict = ForwardAuth::from_config(&config)?
        .decide(&inbound(Some(PACKED)), Vec::new())
        .await;

    let Decision::Error(ref err) = verdict.decision else {
        bail!("expected an error, got {}", verdict.decision.label());
    };
    assert_eq!(err.kind(), "transport");
    assert_eq!(cookie_value(&verdict, "authelia_session"), Some("half"));
    Ok(())
}

#[tokio::test]
async fn nothing_to_check_is_denied_without_calls() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_factors_unreachable(&server).await;

    let verdict = forward_auth(&server)?
        .decide(&inbound(None), [Cookie::new("tracking", "xyz")])
        .await;

    assert!(matches!(verdict.decision, Decision::Deny));
    assert!(verdict.cookies.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_authorization_is_ignored() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("proxy-authorization"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_factors_unreachable(&server).await;

    let mut headers = inbound(None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static(""));

    let verdict = forward_auth(&server)?.decide(&headers, Vec::new()).await;

    assert!(matches!(verdict.decision, Decision::Deny));
    Ok(())
}

#[tokio::test]
async fn login_without_session_cookie_skips_recheck() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firstfactor"))
        .respond_with(ok_status())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/secondfactor/totp"))
        .respond_with(ok_status())
        .expect(1)
        .mount(&server)
        .await;

    let verdict = forward_auth(&server)?
        .decide(&inbound(Some(PACKED)), Vec::new())
        .await;

    assert!(matches!(verdict.decision, Decision::Deny));
    assert!(verdict.cookies.is_empty());

    let received = requests(&server).await?;
    let paths: Vec<&str> = received.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        ["/api/verify", "/api/firstfactor", "/api/secondfactor/totp"]
    );
    assert!(received[0].headers.get("proxy-authorization").is_some());
    Ok(())
}
