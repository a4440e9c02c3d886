//! GenAI attribute normalizer relay.
//!
//! Receives OTLP/HTTP traces, rewrites vendor GenAI attributes to the
//! canonical `gen_ai.*` keys and forwards the result.
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of priority):
//! 1. Default values
//! 2. Config file: `$GENAI_NORMALIZER_CONFIG` or `./genai-normalizer.toml`
//! 3. `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_EXPORTER_OTLP_HEADERS`,
//!    `OTEL_EXPORTER_OTLP_COMPRESSION`
//! 4. Environment variables with `GENAI_NORMALIZER_` prefix
//!
//! # Environment Variables
//!
//! - `GENAI_NORMALIZER_OVERWRITE` - replace existing canonical attributes
//! - `GENAI_NORMALIZER_DROP_ORIGINAL` - remove source attributes after copying
//! - `GENAI_NORMALIZER_RECEIVER__PORT` - OTLP/HTTP listen port
//! - `GENAI_NORMALIZER_EXPORTER__ENDPOINT` - downstream OTLP/HTTP endpoint
//!
//! Without an exporter endpoint, normalised batches are printed to stdout as
//! OTLP JSON.

use anyhow::{Context, Result};
use opentelemetry_genai_normalizer::{Config, Relay};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("failed to initialise tracing subscriber")?;

    let config = Config::load().context("failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    Relay::new(config)
        .run()
        .await
        .context("relay runtime failed")?;

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,opentelemetry_genai_normalizer=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to initialise tracing registry")?;

    Ok(())
}
