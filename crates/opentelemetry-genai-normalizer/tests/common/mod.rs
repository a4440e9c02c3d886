//! Shared test utilities for the normalizer integration tests.
//!
//! Successful exports are checked against `mock-collector`. [`StubCollector`]
//! covers what that server does not expose: request headers and non-200
//! responses.

#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_ENCODING},
    routing::post,
};
use flate2::read::GzDecoder;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span, span::Event};
use prost::Message;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A request captured by [`StubCollector`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub request: ExportTraceServiceRequest,
}

struct StubState {
    captured: Mutex<Vec<CapturedRequest>>,
    status: AtomicU16,
}

/// Records every `/v1/traces` request and answers with a configurable status.
pub struct StubCollector {
    addr: SocketAddr,
    state: Arc<StubState>,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl StubCollector {
    pub async fn start(status: StatusCode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub collector");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let state = Arc::new(StubState {
            captured: Mutex::new(Vec::new()),
            status: AtomicU16::new(status.as_u16()),
        });

        let app = Router::new()
            .route("/v1/traces", post(capture))
            .with_state(Arc::clone(&state));

        let cancel_token = CancellationToken::new();
        let shutdown = cancel_token.clone().cancelled_owned();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await;
        });

        Self {
            addr,
            state,
            cancel_token,
            task,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(1), self.task).await;
    }
}

async fn capture(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let is_gzip = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));

    let raw = if is_gzip {
        let mut out = Vec::new();
        if GzDecoder::new(body.as_ref()).read_to_end(&mut out).is_err() {
            return StatusCode::BAD_REQUEST;
        }
        out
    } else {
        body.to_vec()
    };

    let Ok(request) = ExportTraceServiceRequest::decode(raw.as_slice()) else {
        return StatusCode::BAD_REQUEST;
    };

    state
        .captured
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, request });

    StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
}

/// Polls an HTTP health endpoint until it responds successfully.
pub async fn wait_for_http_ready(base_url: &str, timeout: Duration) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    let url = format!("{base_url}/health");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    while Instant::now() < deadline {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }

    Err(format!(
        "HTTP server health check timed out after {:?} at {}",
        timeout, url
    ))
}

/// Builds a one-span batch with the given span and event attributes.
pub fn single_span_batch(
    name: &str,
    attributes: Vec<KeyValue>,
    events: Vec<Vec<KeyValue>>,
) -> ExportTraceServiceRequest {
    ExportTraceServiceRequest {
        resource_spans: vec![ResourceSpans {
            scope_spans: vec![ScopeSpans {
                spans: vec![Span {
                    name: name.to_string(),
                    trace_id: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
                    span_id: vec![1, 2, 3, 4, 5, 6, 7, 8],
                    attributes,
                    events: events
                        .into_iter()
                        .map(|attributes| Event {
                            name: "gen_ai.content".to_string(),
                            attributes,
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_http_ready_timeout() {
        let result = wait_for_http_ready("http://127.0.0.1:19999", Duration::from_millis(100)).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("timed out"));
    }
}
