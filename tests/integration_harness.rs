//! Integration harness running the relay the way the binary does: configuration
//! from a TOML file plus environment, an instrumented client on one side and an
//! OTLP collector on the other.

#[path = "../crates/opentelemetry-genai-normalizer/tests/common/mod.rs"]
mod common;

use common::wait_for_http_ready;
use mock_collector::{MockServer, Protocol as MockProtocol};
use opentelemetry_genai_normalizer::{Config, Relay, kv, kv_string};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::{InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span, span::Event};
use prost::Message;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use temp_env::async_with_vars;
use tempfile::NamedTempFile;

const CONFIG_TOML: &str = r#"
drop_original = true

[mappings]
"acme.llm.model" = "gen_ai.request.model"
"llm.model" = "gen_ai.response.model"

[system_inference]
enabled = true

[receiver]
host = "127.0.0.1"
port = 0
"#;

fn resource(service: &str) -> Option<Resource> {
    Some(Resource {
        attributes: vec![kv_string("service.name", service)],
        ..Default::default()
    })
}

fn span(name: &str, attributes: Vec<KeyValue>, events: Vec<Vec<KeyValue>>) -> Span {
    Span {
        name: name.to_string(),
        trace_id: vec![7; 16],
        span_id: vec![3; 8],
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
    }
}

/// Two services, each instrumented with a different framework.
fn instrumented_app_batch() -> ExportTraceServiceRequest {
    ExportTraceServiceRequest {
        resource_spans: vec![
            ResourceSpans {
                resource: resource("chat-api"),
                scope_spans: vec![ScopeSpans {
                    scope: Some(InstrumentationScope {
                        name: "openinference.instrumentation.openai".to_string(),
                        ..Default::default()
                    }),
                    spans: vec![span(
                        "ChatCompletion",
                        vec![
                            kv_string("openinference.model_name", "gpt-4o"),
                            kv("openinference.llm.token_count.prompt", 31_i64),
                            kv_string("openai.api_version", "2024-06-01"),
                        ],
                        vec![vec![
                            kv_string("openinference.input.value", "What is OTLP?"),
                            kv_string("openinference.output.value", "A protocol."),
                        ]],
                    )],
                    ..Default::default()
                }],
                ..Default::default()
            },
            ResourceSpans {
                resource: resource("batch-summariser"),
                scope_spans: vec![ScopeSpans {
                    scope: Some(InstrumentationScope {
                        name: "acme.sdk".to_string(),
                        ..Default::default()
                    }),
                    spans: vec![
                        span(
                            "summarise",
                            vec![
                                kv_string("acme.llm.model", "claude-3-haiku"),
                                kv_string("llm.model", "claude-3-haiku-20240307"),
                                kv_string("anthropic.stop_reason", "end_turn"),
                            ],
                            vec![],
                        ),
                        span("db.query", vec![kv_string("db.system", "postgresql")], vec![]),
                    ],
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
    }
}

#[tokio::test]
#[serial]
async fn test_relay_from_file_and_env_config() {
    let collector = MockServer::builder()
        .protocol(MockProtocol::HttpBinary)
        .start()
        .await
        .expect("Failed to start mock collector");

    let mut config_file = NamedTempFile::new().unwrap();
    config_file.write_all(CONFIG_TOML.as_bytes()).unwrap();
    let config_path = config_file.path().to_string_lossy().into_owned();
    let endpoint = format!("http://{}", collector.addr());

    let config = async_with_vars(
        [
            ("GENAI_NORMALIZER_CONFIG", Some(config_path.as_str())),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", Some(endpoint.as_str())),
            ("OTEL_EXPORTER_OTLP_COMPRESSION", None),
            ("OTEL_EXPORTER_OTLP_HEADERS", Some("x-tenant=acme")),
        ],
        async { Config::load().expect("Failed to load configuration") },
    )
    .await;

    assert!(config.drop_original);
    assert_eq!(config.exporter.endpoint.as_deref(), Some(endpoint.as_str()));
    assert_eq!(
        config.exporter.headers.get("x-tenant").map(String::as_str),
        Some("acme")
    );

    let relay = Relay::new(config).start().await.expect("Failed to start relay");
    wait_for_http_ready(&relay.url(), Duration::from_secs(5))
        .await
        .expect("Relay failed to start");

    let request = instrumented_app_batch();
    let response = reqwest::Client::new()
        .post(format!("{}/v1/traces", relay.url()))
        .header("Content-Type", "application/x-protobuf")
        .body(request.encode_to_vec())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    collector
        .wait_for_spans(3, Duration::from_secs(5))
        .await
        .expect("Collector did not receive every span");

    collector
        .with_collector(|c| {
            assert_eq!(c.span_count(), 3);

            c.expect_span_with_name("ChatCompletion")
                .with_attribute("gen_ai.request.model", "gpt-4o")
                .with_attribute("gen_ai.system", "openai")
                .with_attribute("openai.api_version", "2024-06-01")
                .assert_exists();
            c.expect_span_with_name("ChatCompletion")
                .with_attribute("openinference.model_name", "gpt-4o")
                .assert_count(0);

            c.expect_span_with_name("summarise")
                .with_attribute("gen_ai.request.model", "claude-3-haiku")
                .with_attribute("gen_ai.response.model", "claude-3-haiku-20240307")
                .with_attribute("gen_ai.system", "anthropic")
                .assert_exists();
            c.expect_span_with_name("summarise")
                .with_attribute("llm.model", "claude-3-haiku-20240307")
                .assert_count(0);

            c.expect_span_with_name("db.query")
                .with_attribute("db.system", "postgresql")
                .assert_exists();
        })
        .await;

    assert_eq!(relay.receiver().batches_received(), 1);

    relay.shutdown().await.expect("Relay shutdown failed");
    collector.shutdown().await.expect("Failed to shutdown server");
}
