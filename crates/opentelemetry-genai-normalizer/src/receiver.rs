//! OTLP/HTTP trace receiver.
//!
//! Accepts `POST /v1/traces` with protobuf or JSON bodies (optionally
//! gzip-compressed) and hands each request to a [`TracesConsumer`], normally
//! the normalizer. The consumer's result decides the response status.

use crate::config::ReceiverConfig;
use crate::consumer::{ConsumerError, TracesConsumer};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_ENCODING, CONTENT_TYPE},
    },
    routing::{get, post},
};
use flate2::read::GzDecoder;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use serde::Serialize;
use std::future::Future;
use std::io::Read;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Server future returned by [`OtlpReceiver::start`].
pub type ServerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle for a running receiver.
///
/// Use it to find the bound address when port 0 was requested.
#[derive(Debug, Clone)]
pub struct ReceiverHandle {
    stats: Arc<ReceiverStats>,
    local_addr: SocketAddr,
}

impl ReceiverHandle {
    /// Returns the actual bound address of the receiver.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the port the receiver is listening on.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the base URL of the receiver.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Returns the number of batches accepted by the consumer.
    pub fn batches_received(&self) -> u64 {
        self.stats.batches_received.load(Ordering::Relaxed)
    }

    /// Returns the number of batches rejected by the consumer.
    pub fn batches_failed(&self) -> u64 {
        self.stats.batches_failed.load(Ordering::Relaxed)
    }
}

/// OTLP/HTTP receiver feeding a traces consumer.
pub struct OtlpReceiver<C> {
    config: ReceiverConfig,
    consumer: Arc<C>,
    cancel_token: CancellationToken,
}

impl<C> OtlpReceiver<C>
where
    C: TracesConsumer + 'static,
{
    /// Creates a new receiver.
    ///
    /// * `config` - listen address
    /// * `consumer` - stage every decoded request is passed to
    /// * `cancel_token` - stops the server gracefully when cancelled
    pub fn new(config: ReceiverConfig, consumer: Arc<C>, cancel_token: CancellationToken) -> Self {
        Self {
            config,
            consumer,
            cancel_token,
        }
    }

    /// Binds the listener and returns a handle plus the server future.
    ///
    /// The future must be spawned or awaited for requests to be served.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the address.
    pub async fn start(self) -> Result<(ReceiverHandle, ServerFuture), std::io::Error> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let local_addr = listener.local_addr()?;

        let stats = Arc::new(ReceiverStats::default());
        let handle = ReceiverHandle {
            stats: Arc::clone(&stats),
            local_addr,
        };

        let state = Arc::new(ReceiverState {
            consumer: self.consumer,
            stats,
        });

        let app = Router::new()
            .route("/health", get(handle_health::<C>))
            .route("/v1/traces", post(handle_traces::<C>))
            .with_state(state);

        tracing::info!(addr = %local_addr, "OTLP HTTP receiver started");

        let cancel_token = self.cancel_token;
        let future: ServerFuture = Box::pin(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(cancel_token.cancelled_owned())
                .await
            {
                tracing::error!(error = %e, "OTLP HTTP receiver failed");
            }
        });

        Ok((handle, future))
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ready"` once the server is accepting requests.
    pub status: &'static str,
    /// Number of batches accepted.
    pub batches_received: u64,
}

#[derive(Debug, Default)]
struct ReceiverStats {
    batches_received: AtomicU64,
    batches_failed: AtomicU64,
}

struct ReceiverState<C> {
    consumer: Arc<C>,
    stats: Arc<ReceiverStats>,
}

async fn handle_health<C>(State(state): State<Arc<ReceiverState<C>>>) -> Json<HealthResponse>
where
    C: TracesConsumer + 'static,
{
    Json(HealthResponse {
        status: "ready",
        batches_received: state.stats.batches_received.load(Ordering::Relaxed),
    })
}

async fn handle_traces<C>(
    State(state): State<Arc<ReceiverState<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode
where
    C: TracesConsumer + 'static,
{
    let content_type = headers.get(CONTENT_TYPE);
    let content_encoding = headers.get(CONTENT_ENCODING);
    let request = match parse_request(content_type, content_encoding, &body) {
        Ok(req) => req,
        Err(status) => return status,
    };

    match TracesConsumer::consume_traces(state.consumer.as_ref(), request).await {
        Ok(()) => {
            state.stats.batches_received.fetch_add(1, Ordering::Relaxed);
            StatusCode::OK
        }
        Err(e) => {
            state.stats.batches_failed.fetch_add(1, Ordering::Relaxed);
            let status = error_status(&e);
            tracing::warn!(error = %e, status = status.as_u16(), "Downstream rejected trace batch");
            status
        }
    }
}

/// Maps a consumer error to the response status.
///
/// A status reported by the downstream is passed back as-is; anything else is
/// a bad gateway.
pub fn error_status(error: &ConsumerError) -> StatusCode {
    error
        .http_status()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn parse_request(
    content_type: Option<&HeaderValue>,
    content_encoding: Option<&HeaderValue>,
    body: &Bytes,
) -> Result<ExportTraceServiceRequest, StatusCode> {
    let is_gzip = content_encoding
        .and_then(|ce| ce.to_str().ok())
        .is_some_and(|ce| ce.contains("gzip"));

    let decompressed: Vec<u8>;
    let body_bytes: &[u8] = if is_gzip {
        decompressed = decompress_gzip(body)?;
        &decompressed
    } else {
        body.as_ref()
    };

    let is_json = content_type
        .and_then(|ct| ct.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        serde_json::from_slice(body_bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JSON request");
            StatusCode::BAD_REQUEST
        })
    } else {
        ExportTraceServiceRequest::decode(body_bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse protobuf request");
            StatusCode::BAD_REQUEST
        })
    }
}

fn decompress_gzip(body: &Bytes) -> Result<Vec<u8>, StatusCode> {
    let mut decoder = GzDecoder::new(body.as_ref());
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).map_err(|e| {
        tracing::error!(error = %e, "Failed to decompress gzip body");
        StatusCode::BAD_REQUEST
    })?;
    Ok(decompressed)
}
