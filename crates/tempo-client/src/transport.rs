//! Transports that open a one-way event stream.
//!
//! [`Transport`] is the seam between the reconnect loop and the network.
//! [`HttpTransport`] speaks HTTP via `reqwest`; tests substitute scripted
//! transports.

use core::future::Future;
use core::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tempo_types::IndexData;

use crate::error::{ClientError, TransportError};

/// Raw bytes of an open event stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Header carrying the id of the last event seen before a reconnect.
pub const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Opens event-stream connections.
pub trait Transport: Send + Sync + 'static {
    /// Open a new connection, resuming after `last_event_id` when given.
    fn connect(
        &self,
        last_event_id: Option<String>,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send;
}

/// HTTP transport for a single stream URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport for `url`.
    ///
    /// The client has a connect timeout but no overall request timeout,
    /// since a healthy stream never completes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The stream URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the index loader data (`GET {base_url}/` as JSON).
    ///
    /// Its `time` field is the consumer's fallback value.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body is not valid loader data.
    pub async fn fetch_index_data(&self, base_url: &str) -> Result<IndexData, ClientError> {
        let url = format!("{}/", base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("loader request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http(format!("loader returned {status}")));
        }

        response
            .json::<IndexData>()
            .await
            .map_err(|e| ClientError::Http(format!("loader response parse failed: {e}")))
    }
}

impl Transport for HttpTransport {
    async fn connect(&self, last_event_id: Option<String>) -> Result<ByteStream, TransportError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header(LAST_EVENT_ID, id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.starts_with("text/event-stream") {
            return Err(TransportError::ContentType(content_type));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())));
        Ok(Box::pin(stream))
    }
}
