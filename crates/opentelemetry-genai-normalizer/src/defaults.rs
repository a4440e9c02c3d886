//! Built-in mapping rules and system prefixes.
//!
//! These tables are process-wide constants. Mapping tables and inferencers
//! copy from them at construction and never write back.

/// Canonical `gen_ai.*` attribute keys.
pub mod semconv {
    /// Model requested by the caller.
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
    /// Provider or system that served the request.
    pub const GEN_AI_SYSTEM: &str = "gen_ai.system";
    /// Prompt token count.
    pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
    /// Completion token count.
    pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
    /// Total token count.
    pub const GEN_AI_USAGE_TOTAL_TOKENS: &str = "gen_ai.usage.total_tokens";
    /// Sampling temperature.
    pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";
    /// Maximum tokens to generate.
    pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";
    /// Nucleus sampling parameter.
    pub const GEN_AI_REQUEST_TOP_P: &str = "gen_ai.request.top_p";
    /// Stop sequences.
    pub const GEN_AI_REQUEST_STOP_SEQUENCES: &str = "gen_ai.request.stop_sequences";
    /// Frequency penalty.
    pub const GEN_AI_REQUEST_FREQUENCY_PENALTY: &str = "gen_ai.request.frequency_penalty";
    /// Presence penalty.
    pub const GEN_AI_REQUEST_PRESENCE_PENALTY: &str = "gen_ai.request.presence_penalty";
    /// Finish reasons reported by the model.
    pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";
    /// Model that actually produced the response.
    pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";
    /// Provider response identifier.
    pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";
    /// Prompt content.
    pub const GEN_AI_PROMPT: &str = "gen_ai.prompt";
    /// Completion content.
    pub const GEN_AI_COMPLETION: &str = "gen_ai.completion";
    /// Operation name (chat, completion, embeddings, ...).
    pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
    /// Request cost.
    pub const GEN_AI_USAGE_COST: &str = "gen_ai.usage.cost";
}

use semconv::*;

/// Default source → canonical key rules.
///
/// Covers the `llm.*` convention, OpenInference, Traceloop (OpenLLMetry),
/// LangChain, LiteLLM and a handful of bare keys emitted by custom SDKs.
/// Source keys are unique.
pub static DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Model
    ("llm.model", GEN_AI_REQUEST_MODEL),
    ("llm.request.model", GEN_AI_REQUEST_MODEL),
    ("llm.model_name", GEN_AI_REQUEST_MODEL),
    ("openinference.model_name", GEN_AI_REQUEST_MODEL),
    ("traceloop.entity.model", GEN_AI_REQUEST_MODEL),
    ("langchain.llm.model_name", GEN_AI_REQUEST_MODEL),
    ("litellm.model", GEN_AI_REQUEST_MODEL),
    ("model_name", GEN_AI_REQUEST_MODEL),
    ("model", GEN_AI_REQUEST_MODEL),
    // Provider
    ("llm.vendor", GEN_AI_SYSTEM),
    ("llm.provider", GEN_AI_SYSTEM),
    ("openinference.llm.provider", GEN_AI_SYSTEM),
    ("traceloop.entity.provider", GEN_AI_SYSTEM),
    ("langchain.llm.provider", GEN_AI_SYSTEM),
    ("litellm.provider", GEN_AI_SYSTEM),
    // Prompt tokens
    ("llm.usage.prompt_tokens", GEN_AI_USAGE_INPUT_TOKENS),
    ("llm.token_count.prompt", GEN_AI_USAGE_INPUT_TOKENS),
    ("openinference.llm.token_count.prompt", GEN_AI_USAGE_INPUT_TOKENS),
    ("traceloop.entity.input_tokens", GEN_AI_USAGE_INPUT_TOKENS),
    ("langchain.tokens.prompt", GEN_AI_USAGE_INPUT_TOKENS),
    ("litellm.usage.prompt_tokens", GEN_AI_USAGE_INPUT_TOKENS),
    ("prompt_tokens", GEN_AI_USAGE_INPUT_TOKENS),
    ("input_tokens", GEN_AI_USAGE_INPUT_TOKENS),
    // Completion tokens
    ("llm.usage.completion_tokens", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("llm.token_count.completion", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("openinference.llm.token_count.completion", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("traceloop.entity.output_tokens", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("langchain.tokens.completion", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("litellm.usage.completion_tokens", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("completion_tokens", GEN_AI_USAGE_OUTPUT_TOKENS),
    ("output_tokens", GEN_AI_USAGE_OUTPUT_TOKENS),
    // Total tokens
    ("llm.usage.total_tokens", GEN_AI_USAGE_TOTAL_TOKENS),
    ("llm.token_count.total", GEN_AI_USAGE_TOTAL_TOKENS),
    ("total_tokens", GEN_AI_USAGE_TOTAL_TOKENS),
    // Request parameters
    ("llm.temperature", GEN_AI_REQUEST_TEMPERATURE),
    ("llm.request.temperature", GEN_AI_REQUEST_TEMPERATURE),
    ("openinference.llm.temperature", GEN_AI_REQUEST_TEMPERATURE),
    ("llm.max_tokens", GEN_AI_REQUEST_MAX_TOKENS),
    ("llm.request.max_tokens", GEN_AI_REQUEST_MAX_TOKENS),
    ("openinference.llm.max_tokens", GEN_AI_REQUEST_MAX_TOKENS),
    ("max_tokens", GEN_AI_REQUEST_MAX_TOKENS),
    ("llm.top_p", GEN_AI_REQUEST_TOP_P),
    ("llm.request.top_p", GEN_AI_REQUEST_TOP_P),
    ("top_p", GEN_AI_REQUEST_TOP_P),
    ("llm.stop_sequences", GEN_AI_REQUEST_STOP_SEQUENCES),
    ("llm.frequency_penalty", GEN_AI_REQUEST_FREQUENCY_PENALTY),
    ("llm.presence_penalty", GEN_AI_REQUEST_PRESENCE_PENALTY),
    // Response
    ("llm.response.finish_reason", GEN_AI_RESPONSE_FINISH_REASONS),
    ("llm.finish_reason", GEN_AI_RESPONSE_FINISH_REASONS),
    ("finish_reason", GEN_AI_RESPONSE_FINISH_REASONS),
    ("llm.response.model", GEN_AI_RESPONSE_MODEL),
    ("llm.response.id", GEN_AI_RESPONSE_ID),
    // Content
    ("llm.prompt", GEN_AI_PROMPT),
    ("llm.completion", GEN_AI_COMPLETION),
    ("openinference.input.value", GEN_AI_PROMPT),
    ("openinference.output.value", GEN_AI_COMPLETION),
    ("traceloop.entity.input", GEN_AI_PROMPT),
    ("traceloop.entity.output", GEN_AI_COMPLETION),
    // Operation
    ("llm.request.type", GEN_AI_OPERATION_NAME),
    ("llm.operation", GEN_AI_OPERATION_NAME),
    ("llm.operation_name", GEN_AI_OPERATION_NAME),
    ("traceloop.entity.type", GEN_AI_OPERATION_NAME),
    // Cost
    ("llm.usage.cost", GEN_AI_USAGE_COST),
    ("llm.usage.cost_usd", GEN_AI_USAGE_COST),
    ("gen_ai.usage.cost_usd", GEN_AI_USAGE_COST),
    ("litellm.cost", GEN_AI_USAGE_COST),
];

/// Default key prefix → system rules, in priority order.
///
/// When several prefixes are present on one span the earliest entry wins.
pub static DEFAULT_SYSTEM_PREFIXES: &[(&str, &str)] = &[
    ("openai.", "openai"),
    ("azure_openai.", "az.ai.openai"),
    ("anthropic.", "anthropic"),
    ("cohere.", "cohere"),
    ("mistral.", "mistral_ai"),
    ("groq.", "groq"),
    ("aws.bedrock.", "aws.bedrock"),
    ("bedrock.", "aws.bedrock"),
    ("vertex_ai.", "vertex_ai"),
    ("gemini.", "gemini"),
    ("ollama.", "ollama"),
];
