//! Configuration loading and management.
//!
//! Configuration is layered with figment. Later sources override earlier ones:
//! 1. Default values (compiled in)
//! 2. Config file: `$GENAI_NORMALIZER_CONFIG` or `genai-normalizer.toml` (optional)
//! 3. Standard OpenTelemetry exporter variables (`OTEL_EXPORTER_OTLP_*`)
//! 4. Normalizer variables (`GENAI_NORMALIZER_*`, nested with `__`)
//!
//! # Example
//!
//! ```toml
//! enable_defaults = true
//! overwrite = false
//! drop_original = true
//!
//! [mappings]
//! "custom.model.name" = "gen_ai.request.model"
//!
//! [system_inference]
//! enabled = true
//!
//! [exporter]
//! endpoint = "http://collector:4318"
//! compression = "gzip"
//! ```
//!
//! # Supported Standard Environment Variables
//!
//! | Variable | Config Path |
//! |----------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `exporter.endpoint` |
//! | `OTEL_EXPORTER_OTLP_HEADERS` | `exporter.headers` (comma-separated `key=value`) |
//! | `OTEL_EXPORTER_OTLP_COMPRESSION` | `exporter.compression` |

use crate::defaults::semconv;
use crate::inference::{PrefixRule, SystemInferencer, default_prefix_rules};
use crate::mapper::AttributeMapper;
use crate::table::MappingTable;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "genai-normalizer.toml";
const CONFIG_PATH_ENV: &str = "GENAI_NORMALIZER_CONFIG";
const ENV_PREFIX: &str = "GENAI_NORMALIZER_";

/// Compression applied to forwarded requests.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression.
    #[default]
    None,
    /// Gzip compression.
    Gzip,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed the mapping table with the built-in rules.
    pub enable_defaults: bool,
    /// User rules, `source -> destination`. Override defaults on collision.
    pub mappings: HashMap<String, String>,
    /// Replace a destination attribute that is already present.
    pub overwrite: bool,
    /// Remove the source attribute after a successful copy.
    pub drop_original: bool,
    /// Provider inference from key prefixes.
    pub system_inference: InferenceConfig,
    /// OTLP/HTTP receiver.
    pub receiver: ReceiverConfig,
    /// Downstream OTLP/HTTP exporter.
    pub exporter: ExporterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_defaults: true,
            mappings: HashMap::new(),
            overwrite: false,
            drop_original: false,
            system_inference: InferenceConfig::default(),
            receiver: ReceiverConfig::default(),
            exporter: ExporterConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// The file path is taken from `GENAI_NORMALIZER_CONFIG`, falling back to
    /// `genai-normalizer.toml` in the working directory. A missing file is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    #[allow(clippy::result_large_err)]
    pub fn load() -> Result<Self, figment::Error> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(path)
    }

    /// Loads configuration from a custom config file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    #[allow(clippy::result_large_err)]
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_path.as_ref().exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(standard_otel_env());
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));

        figment.extract()
    }

    /// Creates a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Builds the mapping table described by this configuration.
    pub fn mapping_table(&self) -> MappingTable {
        MappingTable::build(self.enable_defaults, &self.mappings)
    }

    /// Builds the attribute mapper described by this configuration.
    pub fn mapper(&self) -> AttributeMapper {
        AttributeMapper::new(self.mapping_table(), self.overwrite, self.drop_original)
    }

    /// Builds the system inferencer, if inference is enabled.
    pub fn inferencer(&self) -> Option<SystemInferencer> {
        self.system_inference.enabled.then(|| {
            SystemInferencer::new(
                self.system_inference.prefixes.clone(),
                self.system_inference.attribute.clone(),
            )
        })
    }
}

/// Provider inference configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Whether inference runs at all.
    pub enabled: bool,
    /// Attribute key written by inference.
    pub attribute: String,
    /// Prefix rules in priority order.
    pub prefixes: Vec<PrefixRule>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attribute: semconv::GEN_AI_SYSTEM.to_string(),
            prefixes: default_prefix_rules(),
        }
    }
}

/// OTLP/HTTP receiver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Listen address.
    pub host: String,
    /// Listen port (default 4318). Port 0 picks a free port.
    pub port: u16,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4318,
        }
    }
}

/// Downstream exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// OTLP/HTTP base URL. Without one, batches are written to stdout.
    pub endpoint: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    /// Compression algorithm.
    pub compression: Compression,
    /// Additional headers to send with requests.
    pub headers: HashMap<String, String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_millis(5000),
            compression: Compression::None,
            headers: HashMap::new(),
        }
    }
}

/// Builder for constructing configuration programmatically.
#[must_use = "builders do nothing unless .build() is called"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new config builder with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Enables or disables the built-in mapping rules.
    pub fn enable_defaults(mut self, enabled: bool) -> Self {
        self.config.enable_defaults = enabled;
        self
    }

    /// Adds a user mapping rule.
    pub fn mapping(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.config
            .mappings
            .insert(source.into(), destination.into());
        self
    }

    /// Sets whether existing destinations are overwritten.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    /// Sets whether source attributes are removed after a copy.
    pub fn drop_original(mut self, drop_original: bool) -> Self {
        self.config.drop_original = drop_original;
        self
    }

    /// Enables or disables provider inference.
    pub fn system_inference(mut self, enabled: bool) -> Self {
        self.config.system_inference.enabled = enabled;
        self
    }

    /// Sets the receiver listen address.
    pub fn receiver_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.receiver.host = host.into();
        self.config.receiver.port = port;
        self
    }

    /// Sets the exporter endpoint.
    pub fn exporter_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.exporter.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the exporter timeout.
    pub fn exporter_timeout(mut self, timeout: Duration) -> Self {
        self.config.exporter.timeout = timeout;
        self
    }

    /// Sets the exporter compression.
    pub fn exporter_compression(mut self, compression: Compression) -> Self {
        self.config.exporter.compression = compression;
        self
    }

    /// Adds an exporter request header.
    pub fn exporter_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.exporter.headers.insert(key.into(), value.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial exporter config for standard OTEL env var overrides.
#[derive(Debug, Default, Serialize)]
struct PartialExporterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<Compression>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    headers: HashMap<String, String>,
}

impl PartialExporterConfig {
    fn is_empty(&self) -> bool {
        self.endpoint.is_none() && self.compression.is_none() && self.headers.is_empty()
    }
}

/// Partial config for standard OTEL env var overrides.
#[derive(Debug, Default, Serialize)]
struct PartialConfig {
    #[serde(skip_serializing_if = "PartialExporterConfig::is_empty")]
    exporter: PartialExporterConfig,
}

fn standard_otel_env() -> Serialized<PartialConfig> {
    let mut config = PartialConfig::default();

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.exporter.endpoint = Some(endpoint);
    }

    if let Ok(compression) = std::env::var("OTEL_EXPORTER_OTLP_COMPRESSION") {
        config.exporter.compression = match compression.to_lowercase().as_str() {
            "gzip" => Some(Compression::Gzip),
            "none" => Some(Compression::None),
            _ => None,
        };
    }

    if let Ok(headers) = std::env::var("OTEL_EXPORTER_OTLP_HEADERS") {
        config.exporter.headers = parse_headers(&headers);
    }

    Serialized::defaults(config)
}

fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
