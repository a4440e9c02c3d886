//! OTLP/HTTP forwarder for normalised trace batches.
//!
//! Each batch is sent exactly once. Retries, queuing and backpressure belong
//! to whatever sits downstream; a failed send is returned to the caller.

use crate::config::{Compression, ExporterConfig};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use reqwest::Client;
use std::io::Write;

const TRACES_PATH: &str = "/v1/traces";
const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Error while forwarding a batch.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// HTTP request failed.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code returned by server.
        status: u16,
        /// Response body from server.
        body: String,
    },

    /// Encoding failed.
    #[error("failed to encode request")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No endpoint configured.
    #[error("no endpoint configured")]
    NoEndpoint,
}

impl ForwardError {
    pub(crate) fn encode<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Encode(Box::new(error))
    }

    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status reported by the downstream server, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Sends trace batches to an OTLP/HTTP endpoint as protobuf.
#[derive(Debug, Clone)]
pub struct OtlpForwarder {
    config: ExporterConfig,
    client: Client,
}

impl OtlpForwarder {
    /// Creates a forwarder.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or the HTTP client cannot
    /// be created.
    pub fn new(config: ExporterConfig) -> Result<Self, ForwardError> {
        if config.endpoint.is_none() {
            return Err(ForwardError::NoEndpoint);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ForwardError::Http)?;

        Ok(Self { config, client })
    }

    /// Returns the full URL batches are posted to.
    pub fn traces_url(&self) -> Option<String> {
        self.config
            .endpoint
            .as_deref()
            .map(|endpoint| format!("{}{}", endpoint.trim_end_matches('/'), TRACES_PATH))
    }

    /// Sends one batch.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the non-success status from the server.
    pub async fn forward(&self, request: &ExportTraceServiceRequest) -> Result<(), ForwardError> {
        let url = self.traces_url().ok_or(ForwardError::NoEndpoint)?;
        let body = self.encode_request(request)?;

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", PROTOBUF_CONTENT_TYPE)
            .body(body);

        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }

        if self.config.compression == Compression::Gzip {
            builder = builder.header("Content-Encoding", "gzip");
        }

        let response = builder.send().await.map_err(ForwardError::Http)?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(%url, status = status.as_u16(), "Batch forwarded");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ForwardError::status(status.as_u16(), body))
        }
    }

    fn encode_request(&self, request: &ExportTraceServiceRequest) -> Result<Vec<u8>, ForwardError> {
        let mut buf = Vec::with_capacity(request.encoded_len());
        request.encode(&mut buf).map_err(ForwardError::encode)?;

        if self.config.compression == Compression::Gzip {
            use flate2::Compression as GzCompression;
            use flate2::write::GzEncoder;

            let mut encoder = GzEncoder::new(Vec::new(), GzCompression::default());
            encoder.write_all(&buf).map_err(ForwardError::encode)?;
            encoder.finish().map_err(ForwardError::encode)
        } else {
            Ok(buf)
        }
    }
}
