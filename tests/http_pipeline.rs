//! Pipeline tests over real HTTP against wiremock provider stand-ins.

use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use verdict::config::{ProviderConfig, VerdictConfig};
use verdict::consensus::Resolution;
use verdict::coordinator::Coordinator;
use verdict::decision_log::{
    read_entries, DecisionFilter, DecisionStore, InMemoryDecisionLog, JsonlDecisionLog,
};
use verdict::gateway::{HttpGateway, ProviderGateway};
use verdict::provider::{ErrorKind, StaticCredentialResolver};
use verdict::query::QueryRequest;
use verdict::registry::{BackendDescriptor, ProviderKind, ProviderRegistry};
use verdict::safety::SafetyStatus;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANSWER: &str = "Cylinder 1 misfire. Replace the spark plug. Confidence: 0.9";

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn credentials() -> Arc<StaticCredentialResolver> {
    Arc::new(
        StaticCredentialResolver::new()
            .with("OPENAI_API_KEY", "sk-test")
            .with("ANTHROPIC_API_KEY", "ant-test"),
    )
}

fn gateway_config() -> VerdictConfig {
    let mut config = VerdictConfig::default();
    config.gateway.base_delay_ms = 1;
    config.gateway.per_call_timeout_ms = 2_000;
    config
}

fn provider(id: &str, url: &str, kind: ProviderKind, credential_key: Option<&str>) -> ProviderConfig {
    let mut p = ProviderConfig::primary(id, url, kind, "test-model");
    p.credential_key = credential_key.map(str::to_string);
    p.cost_per_call = 0.01;
    p
}

#[tokio::test]
async fn test_mixed_provider_kinds_reach_consensus() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(ANSWER)))
        .expect(1)
        .mount(&openai)
        .await;

    let anthropic = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ant-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": ANSWER }]
        })))
        .expect(1)
        .mount(&anthropic)
        .await;

    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "message": { "role": "assistant", "content": ANSWER },
            "done": true
        })))
        .expect(1)
        .mount(&ollama)
        .await;

    let mut config = gateway_config();
    config.providers = vec![
        provider("gpt", &openai.uri(), ProviderKind::OpenAI, Some("OPENAI_API_KEY")),
        provider("claude", &anthropic.uri(), ProviderKind::Anthropic, Some("ANTHROPIC_API_KEY")),
        provider("llama", &ollama.uri(), ProviderKind::Ollama, None),
    ];

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("decisions.jsonl");
    let store = Arc::new(JsonlDecisionLog::open(&log_path).unwrap());

    let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
    let gateway = Arc::new(HttpGateway::new(credentials(), &config.gateway));
    let coordinator = Coordinator::new(&config, registry, gateway, store);

    let entry = coordinator
        .run(&QueryRequest::new("Engine shakes at idle"))
        .await
        .unwrap();

    assert!(entry.primary_results.iter().all(|r| r.is_success()));
    assert_eq!(entry.resolution(), Resolution::Consensus);
    assert_eq!(entry.verdict.as_ref().unwrap().confidence, 0.9);
    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert!((entry.total_cost - 0.03).abs() < 1e-9);

    let persisted = read_entries(&log_path).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].query_id, entry.query_id);
    assert_eq!(persisted[0].decision.status, SafetyStatus::Approved);
    assert_eq!(persisted[0].primary_results.len(), 3);
}

#[tokio::test]
async fn test_transient_failure_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(ANSWER)))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = gateway_config();
    let descriptor = BackendDescriptor::from_config(
        &provider("local", &server.uri(), ProviderKind::Generic, None),
        &config.gateway,
    );
    let gateway = HttpGateway::new(credentials(), &config.gateway);

    let result = gateway
        .call(&descriptor, &QueryRequest::new("Misfire"), &CancellationToken::new())
        .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.cost, 0.01);
    assert_eq!(result.confidence(), Some(0.9));
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
        .expect(1)
        .mount(&server)
        .await;

    let config = gateway_config();
    let descriptor = BackendDescriptor::from_config(
        &provider("local", &server.uri(), ProviderKind::Generic, None),
        &config.gateway,
    );
    let gateway = HttpGateway::new(credentials(), &config.gateway);

    let result = gateway
        .call(&descriptor, &QueryRequest::new("Misfire"), &CancellationToken::new())
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::BadRequest));
    assert_eq!(result.attempts, 1);
}

#[tokio::test]
async fn test_disagreement_escalates_to_tiebreaker_over_http() {
    let brakes = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_completion("Replace the brake pads.")),
        )
        .mount(&brakes)
        .await;

    let cooling = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("Flush the coolant and check the thermostat.")),
        )
        .mount(&cooling)
        .await;

    let judge = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "Replace the thermostat. Confidence: 85%",
        )))
        .expect(1)
        .mount(&judge)
        .await;

    let mut config = gateway_config();
    let mut arbiter = ProviderConfig::tiebreaker("judge", &judge.uri(), ProviderKind::Generic, "big-model");
    arbiter.cost_per_call = 0.05;
    config.providers = vec![
        provider("a", &brakes.uri(), ProviderKind::Generic, None),
        provider("b", &cooling.uri(), ProviderKind::Generic, None),
        arbiter,
    ];

    let (coordinator, store) = {
        let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
        let store = Arc::new(InMemoryDecisionLog::new());
        let gateway = Arc::new(HttpGateway::new(credentials(), &config.gateway));
        (
            Coordinator::new(&config, registry, gateway, store.clone()),
            store,
        )
    };

    let entry = coordinator
        .run(&QueryRequest::new("Temperature gauge climbs"))
        .await
        .unwrap();

    assert_eq!(entry.resolution(), Resolution::Tiebreaker);
    assert_eq!(entry.final_answer, "Replace the thermostat. Confidence: 85%");
    assert_eq!(entry.verdict.as_ref().unwrap().confidence, 0.85);
    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert!((entry.total_cost - 0.07).abs() < 1e-9);
    assert_eq!(
        store
            .query(&DecisionFilter::new())
            .unwrap()
            .len(),
        1
    );
}
