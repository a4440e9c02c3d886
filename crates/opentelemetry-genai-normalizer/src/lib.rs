//! OpenTelemetry trace normalizer for GenAI attributes.
//!
//! Instrumentation libraries name the same LLM facts differently:
//! `llm.model`, `openinference.model_name`, `traceloop.entity.model` and
//! `litellm.model` all mean `gen_ai.request.model`. This crate rewrites those
//! vendor and framework keys onto the canonical `gen_ai.*` names so that
//! downstream consumers only have to understand one convention.
//!
//! The pieces, leaves first:
//!
//! - [`AttributeValue`] and [`AttributeMap`]: typed access to OTLP attributes
//! - [`MappingTable`]: built-in rules plus user overrides, immutable once built
//! - [`AttributeMapper`]: applies a table under overwrite/drop policy
//! - [`SystemInferencer`]: derives `gen_ai.system` from key prefixes
//! - [`GenAiNormalizer`]: walks a trace batch and forwards it downstream
//!
//! The `genai-normalizer` binary wraps the normalizer in an OTLP/HTTP
//! [`Relay`] configured through [`Config`].
//!
//! # Example
//!
//! ```
//! use opentelemetry_genai_normalizer::{AttributeMap, AttributeMapper, MappingTable, kv_string};
//!
//! let mapper = AttributeMapper::new(MappingTable::with_defaults(), false, true);
//! let mut attrs = vec![kv_string("llm.model", "gpt-4o")];
//!
//! mapper.apply(&mut attrs);
//!
//! assert_eq!(attrs.get("gen_ai.request.model"), Some("gpt-4o".into()));
//! assert!(!attrs.contains_key("llm.model"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attributes;
pub mod config;
pub mod consumer;
pub mod defaults;
pub mod error;
pub mod exporter;
pub mod inference;
pub mod mapper;
pub mod processor;
pub mod receiver;
pub mod runtime;
pub mod table;
pub mod value;

/// Component type name used in logs.
pub const NORMALIZER_TYPE: &str = "genai_semantic_normalizer";

pub use attributes::{AttributeMap, kv, kv_string};
pub use config::{Compression, Config, ConfigBuilder, ExporterConfig, InferenceConfig, ReceiverConfig};
pub use consumer::{ConsumerError, Downstream, StdoutConsumer, TracesConsumer, TracesSink};
pub use defaults::{DEFAULT_MAPPINGS, DEFAULT_SYSTEM_PREFIXES, semconv};
pub use error::{NormalizerError, Result};
pub use exporter::{ForwardError, OtlpForwarder};
pub use inference::{PrefixRule, SystemInferencer, default_prefix_rules};
pub use mapper::{AttributeMapper, MappingOutcome};
pub use processor::{BatchSummary, Capabilities, GenAiNormalizer, NormalizerBuilder};
pub use receiver::{HealthResponse, OtlpReceiver, ReceiverHandle, error_status};
pub use runtime::{Relay, RelayError, RelayHandle};
pub use table::{MappingRule, MappingTable};
pub use value::AttributeValue;
