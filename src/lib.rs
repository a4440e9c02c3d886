//! GenAI normalizer workspace - end-to-end tests for the normalizing relay.
//!
//! This is a virtual package that provides workspace-level integration tests.
//! The functionality lives in the workspace member crate:
//!
//! - `opentelemetry-genai-normalizer`: attribute normalizer, OTLP relay and
//!   the `genai-normalizer` binary
