//! Error types for the web application.
//!
//! [`WebError`] unifies all request failure modes into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Form
//! validation failures are not errors: they travel inside a
//! [`Submission`](crate::forms::Submission).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tempo_stream::ProducerError;
use tracing::{error, warn};

use crate::csrf::CsrfError;
use crate::honeypot::HoneypotError;
use crate::signing::SigningError;

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// A secret the request needs is not configured.
    #[error("Missing {0}")]
    MissingSecret(&'static str),

    /// The CSRF check failed.
    #[error("Invalid CSRF token")]
    Csrf(#[from] CsrfError),

    /// The honeypot check failed.
    #[error("Form not submitted properly")]
    Spam(#[from] HoneypotError),

    /// A value could not be signed.
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// The stream producer could not be built.
    #[error("stream error: {0}")]
    Producer(#[from] ProducerError),

    /// A template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        Self::Template(e.to_string())
    }
}

impl WebError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Csrf(_) => StatusCode::FORBIDDEN,
            Self::Spam(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingSecret(_)
            | Self::Signing(_)
            | Self::Producer(_)
            | Self::Template(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Csrf(reason) => warn!(reason = %reason, "rejected form: csrf"),
            Self::Spam(reason) => warn!(reason = %reason, "rejected form: honeypot"),
            Self::NotFound(_) => {}
            Self::MissingSecret(_)
            | Self::Signing(_)
            | Self::Producer(_)
            | Self::Template(_)
            | Self::Serialization(_) => error!(error = %self, "request failed"),
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
