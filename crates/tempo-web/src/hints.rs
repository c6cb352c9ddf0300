//! Client hints and per-request information for the root layout.
//!
//! Browsers report their colour scheme and time zone through cookies set
//! by a small inline script ([`CHECK_SCRIPT`]). When a cookie is missing
//! or stale the script updates it and reloads once, so the server can
//! render the right theme and local time on the next request.

use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tempo_types::{ClientHints, Theme};

use crate::theme::get_theme;

/// Cookie carrying `prefers-color-scheme`.
pub const COLOR_SCHEME_HINT: &str = "CH-prefers-color-scheme";

/// Cookie carrying the IANA time zone.
pub const TIME_ZONE_HINT: &str = "CH-time-zone";

/// Script that keeps the hint cookies current. Rendered inline in the
/// document head, before any content.
pub const CHECK_SCRIPT: &str = r#"(function () {
  var cookies = document.cookie.split(';').map(function (c) { return c.trim(); });
  function read(name) {
    var prefix = name + '=';
    var hit = cookies.find(function (c) { return c.indexOf(prefix) === 0; });
    return hit ? hit.slice(prefix.length) : null;
  }
  var hints = [
    ['CH-prefers-color-scheme', window.matchMedia('(prefers-color-scheme: dark)').matches ? 'dark' : 'light'],
    ['CH-time-zone', Intl.DateTimeFormat().resolvedOptions().timeZone]
  ];
  var changed = false;
  hints.forEach(function (hint) {
    if (read(hint[0]) !== hint[1]) {
      document.cookie = hint[0] + '=' + hint[1] + '; Max-Age=31536000; Path=/; SameSite=Lax';
      changed = true;
    }
  });
  if (changed && navigator.cookieEnabled && read('CH-prefers-color-scheme') !== null) {
    window.location.reload();
  }
})();"#;

/// Read the client hints, falling back to `light` and `UTC`.
pub fn get_hints(jar: &CookieJar) -> ClientHints {
    let fallback = ClientHints::default();
    let theme = jar
        .get(COLOR_SCHEME_HINT)
        .and_then(|c| c.value().parse::<Theme>().ok())
        .unwrap_or(fallback.theme);
    let time_zone = jar
        .get(TIME_ZONE_HINT)
        .map(|c| c.value().replace("%2F", "/"))
        .filter(|tz| is_time_zone_name(tz))
        .unwrap_or(fallback.time_zone);
    ClientHints { theme, time_zone }
}

/// IANA names only use a small alphabet; anything else is ignored.
fn is_time_zone_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '+' | '-'))
}

/// Origin of the current request, e.g. `https://example.com`.
///
/// Uses `X-Forwarded-Host`, then `Host`. Localhost is served over plain
/// HTTP, everything else over HTTPS.
pub fn domain_url(headers: &HeaderMap) -> String {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{host}")
}

/// Stored user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrefs {
    /// Theme cookie, `None` when following the system.
    pub theme: Option<Theme>,
}

/// What the root layout knows about the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Client hints.
    pub hints: ClientHints,
    /// Request origin.
    pub origin: String,
    /// Request path.
    pub path: String,
    /// Stored preferences.
    pub user_prefs: UserPrefs,
}

impl RequestInfo {
    /// Collect the request info from headers, path and cookies.
    pub fn from_request(headers: &HeaderMap, path: &str, jar: &CookieJar) -> Self {
        Self {
            hints: get_hints(jar),
            origin: domain_url(headers),
            path: path.to_owned(),
            user_prefs: UserPrefs {
                theme: get_theme(jar),
            },
        }
    }
}
