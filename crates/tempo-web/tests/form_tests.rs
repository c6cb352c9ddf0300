//! Integration tests for the form actions: CSRF, honeypot, validation
//! and the theme switch.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempo_web::{AppState, WebConfig, build_router};
use tower::ServiceExt;

use common::{Credentials, app, body_json, body_string, credentials, form_body, set_cookies};

fn post(path: &str, cookie: Option<&str>, json: bool, body: String) -> Request<Body> {
    let mut builder = Request::post(path).header("content-type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    if json {
        builder = builder.header("accept", "application/json");
    }
    builder.body(Body::from(body)).unwrap()
}

/// A correctly protected URL form with the given extra fields.
fn protected(creds: &Credentials, fields: &[(&str, &str)]) -> String {
    let mut pairs = vec![
        ("csrf", creds.token.as_str()),
        ("name__confirm", ""),
        ("from__confirm", creds.valid_from.as_str()),
    ];
    pairs.extend_from_slice(fields);
    form_body(&pairs)
}

// =========================================================================
// URL form
// =========================================================================

#[tokio::test]
async fn valid_submission_succeeds() {
    let creds = credentials();
    let body = protected(&creds, &[("url", "https://example.com/page")]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["url"], "https://example.com/page");
    assert_eq!(json["submission"]["payload"]["url"], "https://example.com/page");
    assert!(json["submission"]["payload"].get("csrf").is_none());
}

#[tokio::test]
async fn missing_csrf_token_is_forbidden_despite_valid_data() {
    let creds = credentials();
    let body = form_body(&[
        ("name__confirm", ""),
        ("from__confirm", creds.valid_from.as_str()),
        ("url", "https://example.com"),
    ]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid CSRF token");
}

#[tokio::test]
async fn missing_csrf_cookie_is_forbidden() {
    let creds = credentials();
    let body = protected(&creds, &[("url", "https://example.com")]);
    let response = app().oneshot(post("/", None, true, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_from_another_session_is_forbidden() {
    let ours = credentials();
    let theirs = credentials();
    let body = protected(&theirs, &[("url", "https://example.com")]);
    let response = app()
        .oneshot(post("/", Some(&ours.cookie), true, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn filled_honeypot_is_rejected_despite_valid_data() {
    let creds = credentials();
    let body = form_body(&[
        ("csrf", creds.token.as_str()),
        ("name__confirm", "I am a bot"),
        ("from__confirm", creds.valid_from.as_str()),
        ("url", "https://example.com"),
    ]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Form not submitted properly");
}

#[tokio::test]
async fn missing_honeypot_fields_are_rejected() {
    let creds = credentials();
    let body = form_body(&[("csrf", creds.token.as_str()), ("url", "https://example.com")]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plain_http_url_is_an_invalid_submission() {
    let creds = credentials();
    let body = protected(&creds, &[("url", "http://example.com")]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"], "Invalid submission");
    assert_eq!(json["submission"]["error"]["url"][0], "URL must start with https://");
}

#[tokio::test]
async fn validate_intent_is_idle() {
    let creds = credentials();
    let body = protected(
        &creds,
        &[("url", "not a url"), ("__intent__", "validate/url")],
    );
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "idle");
    assert_eq!(json["submission"]["intent"], "validate/url");
    let messages = json["submission"]["error"]["url"].as_array().unwrap();
    assert!(messages.iter().any(|m| m == "Invalid url"));
}

#[tokio::test]
async fn html_post_renders_errors_inline() {
    let creds = credentials();
    let body = protected(&creds, &[("url", "")]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), false, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_string(response).await;
    assert!(html.contains("Invalid submission"));
    assert!(html.contains("<p id=\"url-error\" class=\"error\">Required</p>"));
    assert!(html.contains("aria-invalid=\"true\""));
}

#[tokio::test]
async fn html_post_shows_the_submitted_url() {
    let creds = credentials();
    let body = protected(&creds, &[("url", "https://example.com")]);
    let response = app()
        .oneshot(post("/", Some(&creds.cookie), false, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("id=\"submitted-url\""));
    assert!(!html.contains("Invalid submission"));
}

#[tokio::test]
async fn missing_secret_fails_the_action() {
    let state = Arc::new(AppState::new(WebConfig::default()).unwrap());
    let creds = credentials();
    let body = protected(&creds, &[("url", "https://example.com")]);
    let response = build_router(state)
        .oneshot(post("/", Some(&creds.cookie), true, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =========================================================================
// Theme switch
// =========================================================================

#[tokio::test]
async fn theme_switch_sets_the_cookie() {
    let response = app()
        .oneshot(post("/theme", None, true, form_body(&[("theme", "dark")])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("theme=dark")));
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn system_theme_clears_the_cookie() {
    let response = app()
        .oneshot(post(
            "/theme",
            Some("theme=dark"),
            true,
            form_body(&[("theme", "system")]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("theme=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn unknown_theme_is_rejected() {
    let response = app()
        .oneshot(post("/theme", None, true, form_body(&[("theme", "sepia")])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn theme_switch_without_script_redirects_home() {
    let response = app()
        .oneshot(post("/theme", None, false, form_body(&[("theme", "light")])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");
    assert!(set_cookies(&response).iter().any(|c| c.starts_with("theme=light")));
}
