//! Downstream trace consumers.
//!
//! The normalizer hands every batch to a [`TracesConsumer`] after rewriting
//! it. This module provides the consumers the relay uses (an OTLP forwarder
//! and a stdout writer) plus [`TracesSink`], which just keeps what it is
//! given.

use crate::exporter::{ForwardError, OtlpForwarder};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Error returned by a downstream consumer.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// Forwarding to an OTLP endpoint failed.
    #[error(transparent)]
    Forward(#[from] ForwardError),

    /// Writing to stdout failed.
    #[error("failed to write batch to stdout")]
    Stdout(#[source] std::io::Error),

    /// Any other consumer failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ConsumerError {
    /// Wraps an arbitrary error.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(error.into())
    }

    /// Returns the HTTP status the downstream reported, if it reported one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Forward(err) => err.http_status(),
            _ => None,
        }
    }
}

/// The next stage of a traces pipeline.
pub trait TracesConsumer: Send + Sync {
    /// Accepts one batch.
    fn consume_traces(
        &self,
        request: ExportTraceServiceRequest,
    ) -> impl Future<Output = Result<(), ConsumerError>> + Send;
}

impl<C: TracesConsumer + ?Sized> TracesConsumer for Arc<C> {
    fn consume_traces(
        &self,
        request: ExportTraceServiceRequest,
    ) -> impl Future<Output = Result<(), ConsumerError>> + Send {
        (**self).consume_traces(request)
    }
}

impl TracesConsumer for OtlpForwarder {
    async fn consume_traces(&self, request: ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        self.forward(&request).await.map_err(ConsumerError::from)
    }
}

/// Writes each batch to stdout as one line of OTLP JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsumer;

impl StdoutConsumer {
    fn write(request: &ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        let json = serde_json::to_string(request).map_err(ConsumerError::other)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").map_err(ConsumerError::Stdout)
    }
}

impl TracesConsumer for StdoutConsumer {
    async fn consume_traces(&self, request: ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        Self::write(&request)
    }
}

/// Keeps every batch it receives.
#[derive(Debug, Default)]
pub struct TracesSink {
    batches: Mutex<Vec<ExportTraceServiceRequest>>,
}

impl TracesSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every batch received so far.
    pub fn all_traces(&self) -> Vec<ExportTraceServiceRequest> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of batches received.
    pub fn batch_count(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the total number of spans received.
    pub fn span_count(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|req| &req.resource_spans)
            .flat_map(|rs| &rs.scope_spans)
            .map(|ss| ss.spans.len())
            .sum()
    }

    /// Discards everything received so far.
    pub fn reset(&self) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl TracesConsumer for TracesSink {
    async fn consume_traces(&self, request: ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(())
    }
}

/// The downstream selected by configuration.
#[derive(Debug, Clone)]
pub enum Downstream {
    /// Forward to an OTLP/HTTP endpoint.
    Otlp(OtlpForwarder),
    /// Write OTLP JSON lines to stdout.
    Stdout(StdoutConsumer),
}

impl TracesConsumer for Downstream {
    async fn consume_traces(&self, request: ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        match self {
            Self::Otlp(forwarder) => forwarder.consume_traces(request).await,
            Self::Stdout(stdout) => stdout.consume_traces(request).await,
        }
    }
}
