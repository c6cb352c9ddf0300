//! HTTP request handlers.
//!
//! Every page handler answers JSON when the request accepts
//! `application/json` and server-rendered HTML otherwise. The root data
//! (request info, CSRF token, honeypot inputs) requires all secrets and
//! fails the request with a 500 when one is missing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Form;
use axum::Json;
use axum::extract::State;
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tempo_types::{IndexData, RequestGeo, iso_timestamp};
use tracing::info;

use crate::csrf::Csrf;
use crate::error::WebError;
use crate::forms::{self, ActionResult, ThemeForm, UrlForm};
use crate::hints::RequestInfo;
use crate::honeypot::{Honeypot, HoneypotInputProps};
use crate::state::AppState;
use crate::templates::{self, IndexView, NotFoundView, Shell, UrlFormView};
use crate::theme::set_theme;
use crate::timing::{SERVER_TIMING, Timings};

/// The browser script, served from `/assets/app.js`.
const APP_JS: &str = include_str!("../assets/app.js");

/// Title of the index page.
const TITLE: &str = "Tempo";

// ---------------------------------------------------------------------------
// Shared loaders
// ---------------------------------------------------------------------------

/// Whether the client asked for JSON.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Data behind the root layout, plus the cookies it set.
struct RootData {
    shell: Shell,
    csrf_token: String,
    honeypot: HoneypotInputProps,
    jar: CookieJar,
    timings: Timings,
}

fn load_root(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    jar: CookieJar,
) -> Result<RootData, WebError> {
    let started = Instant::now();
    let secrets = state.config.secrets.require()?;

    let honeypot = Honeypot::new(secrets.honeypot)?.input_props(Utc::now())?;
    let csrf = Csrf::new(secrets.session, secrets.csrf, state.config.secure_cookies)?;
    let (csrf_token, cookie) = csrf.commit_token(&jar)?;
    let jar = match cookie {
        Some(cookie) => jar.add(cookie),
        None => jar,
    };

    let request_info = RequestInfo::from_request(headers, path, &jar);
    let shell = Shell::new(TITLE, request_info, None);

    let mut timings = Timings::new();
    timings.record("root loader", started.elapsed());

    Ok(RootData {
        shell,
        csrf_token,
        honeypot,
        jar,
        timings,
    })
}

/// Edge properties of the request and the render time.
fn index_data(headers: &HeaderMap) -> IndexData {
    let cf = RequestGeo::from_lookup(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    });
    IndexData {
        cf,
        time: iso_timestamp(Utc::now()),
    }
}

fn render_index(
    state: &AppState,
    root: RootData,
    data: IndexData,
    form: UrlFormView,
    status: StatusCode,
) -> Result<Response, WebError> {
    let RootData {
        shell,
        csrf_token,
        honeypot,
        jar,
        timings,
    } = root;
    let view = IndexView::new(shell, csrf_token, honeypot, data, form)?;
    let html = state.templates.render(templates::INDEX, &view)?;
    Ok((
        status,
        [(SERVER_TIMING, timings.header_value())],
        jar,
        Html(html),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// `GET /` -- the index page, or its loader data as JSON.
///
/// The JSON variant needs no secrets; the terminal consumer uses it to
/// seed its fallback value.
///
/// # Errors
///
/// Fails when a secret is missing or the page cannot be rendered.
pub async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Result<Response, WebError> {
    let data = index_data(&headers);
    if wants_json(&headers) {
        return Ok(Json(data).into_response());
    }

    let root = load_root(&state, &headers, uri.path(), jar)?;
    render_index(&state, root, data, UrlFormView::default(), StatusCode::OK)
}

/// `POST /` -- the URL form action.
///
/// The CSRF and honeypot checks run before the form is parsed, so a
/// forged or automated submission is rejected whatever its content.
///
/// # Errors
///
/// Fails with 403 on a CSRF mismatch, 400 on a tripped honeypot, and 500
/// when a secret is missing.
pub async fn index_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    let secrets = state.config.secrets.require()?;
    Csrf::new(secrets.session, secrets.csrf, state.config.secure_cookies)?
        .validate(&fields, &jar)?;
    Honeypot::new(secrets.honeypot)?.check(&fields, Utc::now())?;

    let submission = forms::parse::<UrlForm>(&fields);
    let result = ActionResult::from_submission(submission, |form| Some(form.url.clone()));
    let status = result.status_code();
    if let ActionResult::Success { url: Some(url), .. } = &result {
        info!(url = %url, "url submitted");
    }

    if wants_json(&headers) {
        return Ok((status, Json(result)).into_response());
    }

    let root = load_root(&state, &headers, uri.path(), jar)?;
    let form = UrlFormView::from(&result);
    render_index(&state, root, index_data(&headers), form, status)
}

/// `POST /theme` -- store the theme preference.
///
/// Script-driven requests get JSON; plain form posts are redirected back
/// to the index page.
pub async fn theme_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let submission = forms::parse::<ThemeForm>(&fields);
    let chosen = submission.value.map(|form| form.theme);
    let result = ActionResult::from_submission(submission, |_| None);
    let status = result.status_code();

    let jar = match chosen {
        Some(preference) => {
            info!(theme = preference.as_str(), "theme preference updated");
            set_theme(jar, preference, state.config.secure_cookies)
        }
        None => jar,
    };

    if wants_json(&headers) || status != StatusCode::OK {
        (status, jar, Json(result)).into_response()
    } else {
        (jar, Redirect::to("/")).into_response()
    }
}

/// `GET /healthz` -- liveness probe.
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "streams": state.active_streams(),
    }))
}

/// `GET /assets/app.js` -- the browser script.
pub async fn app_js() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        APP_JS,
    )
}

/// Fallback for unknown routes: a 404 page naming the path.
///
/// # Errors
///
/// JSON clients get [`WebError::NotFound`].
pub async fn not_found(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Result<Response, WebError> {
    let path = uri.path().to_owned();
    if wants_json(&headers) {
        return Err(WebError::NotFound(path));
    }

    let info = RequestInfo::from_request(&headers, &path, &jar);
    let view = NotFoundView {
        shell: Shell::new("Not found", info, None),
        path,
    };
    let html = state.templates.render(templates::NOT_FOUND, &view)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}
