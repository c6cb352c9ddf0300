//! Axum router construction.
//!
//! Assembles the page, form, stream and asset routes into a single
//! [`Router`]. The stream route allows cross-origin `GET`s so that a page
//! served elsewhere can subscribe; form routes stay same-origin.

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the complete router.
///
/// The router includes:
/// - `GET /` -- index page (HTML) or index loader data (JSON)
/// - `POST /` -- URL form action
/// - `POST /theme` -- theme switch action
/// - `GET /sse/time` -- the time stream
/// - `GET /assets/app.js` -- browser script
/// - `GET /healthz` -- liveness probe
/// - anything else -- 404 page
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let stream: Router<Arc<AppState>> = Router::new()
        .route("/sse/time", get(sse::sse_time))
        .layer(cors);

    Router::new()
        // Pages and actions
        .route("/", get(handlers::index).post(handlers::index_action))
        .route("/theme", post(handlers::theme_action))
        // Static and health
        .route("/assets/app.js", get(handlers::app_js))
        .route("/healthz", get(handlers::healthz))
        .merge(stream)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
