//! End-to-end pipeline scenarios driven through a scripted gateway.

mod common;

use common::{
    config, coordinator, primary, reply, reply_with, tiebreaker, Script, ScriptedGateway,
    PROMPT_RUN,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use verdict::consensus::Resolution;
use verdict::coordinator::{Coordinator, PipelineError};
use verdict::decision_log::{
    DecisionFilter, DecisionLogEntry, DecisionStore, InMemoryDecisionLog, StoreError,
};
use verdict::provider::ErrorKind;
use verdict::query::{QueryContext, QueryRequest};
use verdict::registry::ProviderRegistry;
use verdict::safety::{
    SafetyStatus, REASON_CONFLICT, REASON_INSUFFICIENT, REASON_MODERATE,
    REASON_SAFETY_VIOLATION, REASON_UNVERIFIED_CODE,
};

const MISFIRE_A: &str = "Cylinder 1 misfire detected. Replace the spark plug.";
const MISFIRE_B: &str = "Misfire on cylinder 1. Replace the spark plug.";
const MISFIRE_C: &str = "Replace the spark plug to cure the cylinder 1 misfire.";

fn misfire_gateway() -> ScriptedGateway {
    ScriptedGateway::new()
        .script("a", reply(MISFIRE_A))
        .script("b", reply(MISFIRE_B))
        .script("c", reply(MISFIRE_C))
}

#[tokio::test]
async fn test_agreeing_primaries_are_approved() {
    let config = config(vec![primary("a"), primary("b"), primary("c"), tiebreaker("judge")]);
    let gateway = Arc::new(misfire_gateway().script("judge", reply("unused")));
    let (coordinator, store) = coordinator(&config, gateway.clone());

    let entry = coordinator
        .run(&QueryRequest::new("Engine shakes at idle"))
        .await
        .unwrap();

    let verdict = entry.verdict.as_ref().unwrap();
    assert!(verdict.agreed, "score {}", verdict.score);
    assert!(verdict.score >= 0.75);
    assert_eq!(verdict.resolution, Resolution::Consensus);
    assert!(verdict.shared_terms.contains(&"spark plug".to_string()));
    assert!(verdict.shared_terms.contains(&"misfire".to_string()));

    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert!(entry.decision.escalation_id.is_none());
    assert!(entry.tiebreaker_result.is_none());
    assert_eq!(gateway.calls("judge"), 0);
    assert!((entry.total_cost - 0.03).abs() < 1e-9);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_disagreement_is_resolved_by_tiebreaker_confidence() {
    let config = config(vec![primary("a"), primary("b"), primary("c"), tiebreaker("judge")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply("Replace the brake pads."))
            .script("b", reply("Flush the coolant and check the thermostat."))
            .script("c", reply("A software update for the transmission."))
            .script("judge", reply_with("Replace the thermostat.", 0.55)),
    );
    let (coordinator, _store) = coordinator(&config, gateway.clone());

    let entry = coordinator
        .run(&QueryRequest::new("Temperature gauge climbs"))
        .await
        .unwrap();

    let verdict = entry.verdict.as_ref().unwrap();
    assert!(!verdict.agreed);
    assert!(verdict.score <= 0.2, "score {}", verdict.score);
    assert_eq!(verdict.resolution, Resolution::Tiebreaker);
    assert_eq!(verdict.confidence, 0.55);
    assert_eq!(entry.final_answer, "Replace the thermostat.");
    assert_eq!(gateway.calls("judge"), 1);

    // trusted answer, moderate confidence
    assert_eq!(entry.decision.status, SafetyStatus::Escalated);
    assert_eq!(entry.decision.reason, REASON_MODERATE);
    assert!(entry
        .decision
        .escalation_id
        .as_deref()
        .is_some_and(|id| id.starts_with("ESC-")));
    assert!((entry.total_cost - 0.08).abs() < 1e-9);
}

#[tokio::test]
async fn test_denylisted_phrase_is_rejected() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let gateway = Arc::new(
        misfire_gateway().script(
            "c",
            reply("Misfire on cylinder 1. Replace the spark plug, or bypass the safety system."),
        ),
    );
    let (coordinator, store) = coordinator(&config, gateway);

    let entry = coordinator.run(&QueryRequest::new("Misfire")).await.unwrap();

    assert_eq!(entry.decision.status, SafetyStatus::Rejected);
    assert_eq!(entry.decision.reason, REASON_SAFETY_VIOLATION);
    assert!(entry
        .decision
        .signals
        .iter()
        .any(|s| s.contains("bypass the safety system")));
    assert_eq!(
        store
            .query(&DecisionFilter::new().with_status(SafetyStatus::Rejected))
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_shortfall_goes_straight_to_tiebreaker() {
    let config = config(vec![primary("a"), primary("b"), primary("c"), tiebreaker("judge")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply(MISFIRE_A))
            .script("b", Script::Hang)
            .script("c", Script::Hang)
            .script("judge", reply_with("Replace the ignition coil.", 0.9)),
    );
    let (coordinator, _store) = coordinator(&config, gateway.clone());

    let started = Instant::now();
    let entry = coordinator.run(&QueryRequest::new("Misfire")).await.unwrap();
    assert!(started.elapsed() < PROMPT_RUN);

    assert_eq!(entry.primary_results.len(), 3);
    assert_eq!(
        entry.primary_results.iter().filter(|r| r.is_success()).count(),
        1
    );
    assert!(entry.tiebreaker_result.as_ref().is_some_and(|r| r.is_success()));
    assert!(entry.verdict.is_none());
    assert_eq!(entry.resolution(), Resolution::Tiebreaker);
    assert_eq!(entry.final_answer, "Replace the ignition coil.");
    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert_eq!(gateway.calls("judge"), 1);
}

#[tokio::test]
async fn test_total_failure_writes_nothing() {
    let config = config(vec![primary("a"), primary("b"), tiebreaker("judge")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", Script::Fail(ErrorKind::Server))
            .script("b", Script::Fail(ErrorKind::Network))
            .script("judge", Script::Fail(ErrorKind::Timeout)),
    );
    let (coordinator, store) = coordinator(&config, gateway);

    let result = coordinator.run(&QueryRequest::new("Misfire")).await;

    match result {
        Err(PipelineError::NoProviderAvailable {
            primaries,
            tiebreaker,
        }) => {
            assert_eq!(primaries, 2);
            assert_eq!(tiebreaker, "failed");
        }
        other => panic!("expected NoProviderAvailable, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_failed_tiebreaker_falls_back_to_most_confident_primary() {
    let config = config(vec![primary("a"), primary("b"), tiebreaker("judge")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply_with("Replace the brake pads.", 0.6))
            .script("b", reply_with("Flush the coolant.", 0.9))
            .script("judge", Script::Fail(ErrorKind::RateLimited)),
    );
    let (coordinator, _store) = coordinator(&config, gateway);

    let entry = coordinator.run(&QueryRequest::new("Noise")).await.unwrap();

    let verdict = entry.verdict.as_ref().unwrap();
    assert_eq!(verdict.resolution, Resolution::Fallback);
    assert_eq!(entry.final_answer, "Flush the coolant.");
    assert_eq!(verdict.confidence, 0.9);
    // composite stays low, so the answer is not trusted
    assert_eq!(entry.decision.status, SafetyStatus::Rejected);
    assert_eq!(entry.decision.reason, REASON_INSUFFICIENT);
    assert!(entry.tiebreaker_result.as_ref().is_some_and(|r| !r.is_success()));
}

#[tokio::test]
async fn test_lone_primary_without_tiebreaker_is_unverified() {
    let config = config(vec![primary("a"), primary("b")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply(MISFIRE_A))
            .script("b", Script::Fail(ErrorKind::Authentication)),
    );
    let (coordinator, _store) = coordinator(&config, gateway);

    let entry = coordinator.run(&QueryRequest::new("Misfire")).await.unwrap();

    assert_eq!(entry.resolution(), Resolution::Unverified);
    assert_eq!(entry.final_answer, MISFIRE_A);
    assert!(entry.tiebreaker_result.is_none());
    assert_eq!(entry.decision.status, SafetyStatus::Rejected);
}

#[tokio::test]
async fn test_unknown_code_is_escalated() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let (coordinator, _store) = coordinator(&config, Arc::new(misfire_gateway()));

    let request =
        QueryRequest::new("Misfire").with_context(QueryContext::with_code("P1999"));
    let entry = coordinator.run(&request).await.unwrap();

    assert!(entry.verdict.as_ref().unwrap().agreed);
    assert_eq!(entry.decision.status, SafetyStatus::Escalated);
    assert_eq!(entry.decision.reason, REASON_UNVERIFIED_CODE);
    assert_eq!(entry.context.as_ref().and_then(|c| c.code.as_deref()), Some("P1999"));
}

#[tokio::test]
async fn test_known_code_does_not_block_approval() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let (coordinator, _store) = coordinator(&config, Arc::new(misfire_gateway()));

    let request =
        QueryRequest::new("Misfire").with_context(QueryContext::with_code("p0301"));
    let entry = coordinator.run(&request).await.unwrap();

    assert_eq!(entry.decision.status, SafetyStatus::Approved);
}

#[tokio::test]
async fn test_contradictory_recommendations_are_escalated() {
    let config = config(vec![primary("a"), primary("b")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply("Misfire on cylinder 1: replace the spark plug."))
            .script("b", reply("Misfire on cylinder 1: no action needed on the spark plug.")),
    );
    let (coordinator, _store) = coordinator(&config, gateway);

    let entry = coordinator.run(&QueryRequest::new("Misfire")).await.unwrap();

    assert_eq!(entry.decision.status, SafetyStatus::Escalated);
    assert_eq!(entry.decision.reason, REASON_CONFLICT);
}

#[tokio::test]
async fn test_results_follow_registry_order() {
    let config = config(vec![primary("c"), primary("a"), primary("b")]);
    let (coordinator, _store) = coordinator(&config, Arc::new(misfire_gateway()));

    let entry = coordinator.run(&QueryRequest::new("Misfire")).await.unwrap();
    let ids: Vec<&str> = entry
        .primary_results
        .iter()
        .map(|r| r.backend_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_call_ignoring_cancellation_is_recorded_at_deadline() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply(MISFIRE_A))
            .script("b", reply(MISFIRE_B))
            .script("c", Script::Stuck(Duration::from_secs(30))),
    );
    let (coordinator, store) = coordinator(&config, gateway.clone());

    let started = Instant::now();
    let entry = coordinator
        .run(&QueryRequest::new("Engine shakes at idle"))
        .await
        .unwrap();
    assert!(started.elapsed() < PROMPT_RUN, "took {:?}", started.elapsed());

    let ids: Vec<_> = entry.primary_results.iter().map(|r| r.backend_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let stuck = &entry.primary_results[2];
    assert_eq!(stuck.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(stuck.attempts, 1);
    assert_eq!(stuck.cost, 0.01);
    assert_eq!(gateway.calls("c"), 1);

    assert_eq!(entry.resolution(), Resolution::Consensus);
    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert!((entry.total_cost - 0.03).abs() < 1e-9);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_unanimous_no_repair_answers_are_approved() {
    let text = "Sensor readings are normal, no repair needed. Confidence: 0.9";
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script("a", reply_with(text, 0.9))
            .script("b", reply_with(text, 0.9))
            .script("c", reply_with(text, 0.9)),
    );
    let (coordinator, _store) = coordinator(&config, gateway);

    let entry = coordinator
        .run(&QueryRequest::new("O2 sensor reading looks odd"))
        .await
        .unwrap();

    let verdict = entry.verdict.as_ref().unwrap();
    assert!(verdict.agreed);
    assert_eq!(entry.decision.status, SafetyStatus::Approved);
    assert_ne!(entry.decision.reason, REASON_CONFLICT);
}

#[tokio::test]
async fn test_external_cancellation_stops_the_run() {
    let mut slow = primary("a");
    slow.timeout_ms = Some(60_000);
    let config = config(vec![slow]);
    let gateway = Arc::new(ScriptedGateway::new().script("a", Script::Hang));
    let (coordinator, store) = coordinator(&config, gateway);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let result = coordinator
        .run_with_cancel(&QueryRequest::new("Misfire"), &cancel)
        .await;

    assert!(started.elapsed() < PROMPT_RUN);
    assert!(matches!(
        result,
        Err(PipelineError::NoProviderAvailable {
            tiebreaker: "not configured",
            ..
        })
    ));
    assert!(store.is_empty());
}

struct FailingStore;

impl DecisionStore for FailingStore {
    fn append(&self, _entry: &DecisionLogEntry) -> Result<(), StoreError> {
        Err(StoreError::Poisoned)
    }

    fn query(&self, _filter: &DecisionFilter) -> Result<Vec<DecisionLogEntry>, StoreError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
    let coordinator = Coordinator::new(
        &config,
        registry,
        Arc::new(misfire_gateway()),
        Arc::new(FailingStore),
    );

    let result = coordinator.run(&QueryRequest::new("Misfire")).await;
    assert!(matches!(result, Err(PipelineError::Store(StoreError::Poisoned))));
}

#[tokio::test]
async fn test_concurrent_runs_share_one_coordinator() {
    let config = config(vec![primary("a"), primary("b"), primary("c")]);
    let registry = Arc::new(ProviderRegistry::from_config(&config).unwrap());
    let store = Arc::new(InMemoryDecisionLog::new());
    let coordinator = Arc::new(Coordinator::new(
        &config,
        registry,
        Arc::new(misfire_gateway()),
        store.clone(),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .run(&QueryRequest::new(format!("Misfire {}", i)))
                .await
                .unwrap()
                .query_id
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 8);
    assert_eq!(store.len(), 8);
}
