//! Relay runtime.
//!
//! Wires the pieces together: downstream consumer, normalizer, OTLP receiver.
//! The relay serves until Ctrl-C or until its cancellation token fires.

use crate::config::Config;
use crate::consumer::{Downstream, StdoutConsumer};
use crate::error::NormalizerError;
use crate::exporter::{ForwardError, OtlpForwarder};
use crate::processor::GenAiNormalizer;
use crate::receiver::{OtlpReceiver, ReceiverHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Errors from the relay runtime.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Failed to create the OTLP forwarder.
    #[error("failed to create OTLP forwarder")]
    Forwarder(#[source] ForwardError),

    /// Failed to build or run the normalizer.
    #[error(transparent)]
    Normalizer(#[from] NormalizerError),

    /// Failed to start OTLP receiver.
    #[error("failed to start OTLP receiver")]
    ReceiverStart(#[source] std::io::Error),

    /// Failed to listen for the shutdown signal.
    #[error("failed to listen for shutdown signal")]
    Signal(#[source] std::io::Error),
}

/// Receives OTLP traces, normalises them and passes them downstream.
pub struct Relay {
    config: Config,
    cancel_token: CancellationToken,
}

impl Relay {
    /// Creates a relay with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Creates a relay with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Returns a handle to the cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Builds the downstream consumer selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the forwarder's HTTP client cannot be created.
    pub fn downstream(config: &Config) -> Result<Downstream, RelayError> {
        match config.exporter.endpoint.as_deref() {
            Some(endpoint) => {
                tracing::info!(endpoint, "Forwarding normalised traces over OTLP/HTTP");
                OtlpForwarder::new(config.exporter.clone())
                    .map(Downstream::Otlp)
                    .map_err(RelayError::Forwarder)
            }
            None => {
                tracing::info!("No exporter endpoint configured, writing traces to stdout");
                Ok(Downstream::Stdout(StdoutConsumer))
            }
        }
    }

    /// Starts serving and returns once the receiver is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if any component fails to start.
    pub async fn start(self) -> Result<RelayHandle, RelayError> {
        let downstream = Self::downstream(&self.config)?;
        let normalizer = Arc::new(
            GenAiNormalizer::builder(&self.config)
                .consumer(downstream)
                .build()?,
        );
        normalizer.start().await?;

        let receiver = OtlpReceiver::new(
            self.config.receiver.clone(),
            Arc::clone(&normalizer),
            self.cancel_token.clone(),
        );
        let (receiver, server) = receiver.start().await.map_err(RelayError::ReceiverStart)?;

        Ok(RelayHandle {
            receiver,
            normalizer,
            cancel_token: self.cancel_token,
            server: tokio::spawn(server),
        })
    }

    /// Runs the relay until Ctrl-C or cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error if any component fails to start or the shutdown signal
    /// cannot be installed.
    pub async fn run(self) -> Result<(), RelayError> {
        let cancel_token = self.cancel_token.clone();
        let handle = self.start().await?;

        let signal = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                result.map_err(RelayError::Signal)
            }
            () = cancel_token.cancelled() => {
                tracing::debug!("Relay cancelled");
                Ok(())
            }
        };

        handle.shutdown().await?;
        signal
    }
}

/// A started relay.
pub struct RelayHandle {
    receiver: ReceiverHandle,
    normalizer: Arc<GenAiNormalizer<Downstream>>,
    cancel_token: CancellationToken,
    server: JoinHandle<()>,
}

impl RelayHandle {
    /// Returns the receiver's bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.receiver.local_addr()
    }

    /// Returns the receiver's base URL.
    pub fn url(&self) -> String {
        self.receiver.url()
    }

    /// Returns the receiver handle.
    pub fn receiver(&self) -> &ReceiverHandle {
        &self.receiver
    }

    /// Stops the receiver and runs the normalizer's shutdown hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalizer fails to shut down.
    pub async fn shutdown(self) -> Result<(), RelayError> {
        self.cancel_token.cancel();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.server)
            .await
            .is_err()
        {
            tracing::warn!("OTLP receiver did not stop within the grace period");
        }

        self.normalizer.shutdown().await?;
        tracing::debug!("Relay stopped");
        Ok(())
    }
}
