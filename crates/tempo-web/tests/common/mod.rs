//! Shared helpers for the web integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use axum_extra::extract::cookie::CookieJar;
use chrono::{TimeDelta, Utc};
use tempo_web::csrf::Csrf;
use tempo_web::honeypot::Honeypot;
use tempo_web::{AppState, Secrets, WebConfig, build_router};

pub const SESSION_SECRET: &str = "session-secret";
pub const CSRF_SECRET: &str = "csrf-secret";
pub const HONEYPOT_SECRET: &str = "honeypot-secret";

/// Configuration with every secret and a fast stream.
pub fn config() -> WebConfig {
    WebConfig {
        stream_interval: Duration::from_millis(50),
        secrets: Secrets::new(SESSION_SECRET, CSRF_SECRET, HONEYPOT_SECRET),
        ..WebConfig::default()
    }
}

pub fn state() -> Arc<AppState> {
    Arc::new(AppState::new(config()).unwrap())
}

pub fn app() -> Router {
    build_router(state())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// All `Set-Cookie` values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

/// What a browser holds after loading the index page.
pub struct Credentials {
    /// Token for the `csrf` form field.
    pub token: String,
    /// Value for the `Cookie` header.
    pub cookie: String,
    /// Value for the `from__confirm` field.
    pub valid_from: String,
}

pub fn credentials() -> Credentials {
    let csrf = Csrf::new(SESSION_SECRET, CSRF_SECRET, false).unwrap();
    let (token, cookie) = csrf.commit_token(&CookieJar::new()).unwrap();
    let cookie = cookie.unwrap();
    let props = Honeypot::new(HONEYPOT_SECRET)
        .unwrap()
        .input_props(Utc::now() - TimeDelta::seconds(1))
        .unwrap();
    Credentials {
        token,
        cookie: format!("{}={}", cookie.name(), cookie.value()),
        valid_from: props.encrypted_valid_from,
    }
}

/// `application/x-www-form-urlencoded` body.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    let mut out = String::new();
    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            ' ' => out.push('+'),
            other => {
                let mut buf = [0_u8; 4];
                for byte in other.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    out
}
