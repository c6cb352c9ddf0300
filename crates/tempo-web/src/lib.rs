//! Web application for the Tempo template.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Index page** (`GET /`) rendered with `minijinja`, or its loader data
//!   as JSON for script and terminal clients
//! - **Form actions** (`POST /`, `POST /theme`) guarded by CSRF and
//!   honeypot checks where they accept user content
//! - **Time stream** (`GET /sse/time`): one named `time` event per period
//!   over server-sent events
//!
//! # Architecture
//!
//! Handlers share an immutable [`AppState`]. Every stream connection owns
//! a producer task from [`tempo_stream`], cancelled when its response body
//! is dropped or when the server's shutdown token fires.
//!
//! ```text
//! request --> TraceLayer --> handler --> templates / forms / csrf / honeypot
//!                               |
//!                               +--> sse --> StreamProducer task --> mpsc --> body
//! ```

pub mod config;
pub mod csrf;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod hints;
pub mod honeypot;
pub mod router;
pub mod server;
pub mod signing;
pub mod sse;
pub mod state;
pub mod templates;
pub mod theme;
pub mod timing;

// Re-export primary types for convenience.
pub use config::{ConfigError, Secrets, WebConfig};
pub use error::WebError;
pub use router::build_router;
pub use server::{ServerError, serve, start_server};
pub use state::AppState;
