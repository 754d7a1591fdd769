//! Tests for router module

use super::*;
use crate::completion::CompletionRequest;
use crate::error::Error;
use crate::health::HealthTracker;
use std::sync::Arc;

fn table() -> Vec<ProviderModelSpec> {
    vec![
        ProviderModelSpec::new("anthropic", "opus")
            .with_capability("reasoning", 10)
            .with_capability("coding", 9)
            .with_cost_per_1k(0.075)
            .with_max_context(200_000)
            .with_avg_latency_ms(4_000),
        ProviderModelSpec::new("google", "pro")
            .with_capability("reasoning", 8)
            .with_capability("coding", 7)
            .with_capability("vision", 9)
            .with_cost_per_1k(0.01)
            .with_max_context(1_000_000)
            .with_avg_latency_ms(2_000),
        ProviderModelSpec::new("openai", "mini")
            .with_capability("reasoning", 6)
            .with_capability("coding", 6)
            .with_cost_per_1k(0.001)
            .with_max_context(128_000)
            .with_avg_latency_ms(600),
        ProviderModelSpec::new("local", "tiny")
            .with_capability("reasoning", 3)
            .with_cost_per_1k(0.0)
            .with_max_context(8_000)
            .with_avg_latency_ms(100),
    ]
}

fn router() -> CapabilityRouter {
    CapabilityRouter::new(table(), RoutingRules::default()).unwrap()
}

fn names(candidates: &[ScoredCandidate]) -> Vec<&str> {
    candidates.iter().map(ScoredCandidate::provider).collect()
}

#[test]
fn test_reference_cost_defaults_to_most_expensive() {
    assert_eq!(router().reference_cost(), 0.075);

    let pinned = CapabilityRouter::new(table(), RoutingRules::default().with_reference_cost(1.0))
        .unwrap();
    assert_eq!(pinned.reference_cost(), 1.0);
}

#[test]
fn test_ranks_by_weighted_capability_score() {
    let request = CompletionRequest::new(serde_json::Value::Null).require("reasoning");
    let candidates = router().select_candidates(&request).unwrap();

    // local scores 3 on reasoning and is filtered out
    assert_eq!(names(&candidates), ["anthropic", "google", "openai"]);
    assert!((candidates[0].score - 30.0).abs() < 1e-9);
    assert!((candidates[1].score - (24.0 + 0.065)).abs() < 1e-9);
}

#[test]
fn test_preferred_capabilities_add_to_score() {
    let request = CompletionRequest::new(serde_json::Value::Null)
        .require("coding")
        .prefer("vision");
    let router = router();
    let opus = router.spec("anthropic", "opus").unwrap();
    let pro = router.spec("google", "pro").unwrap();

    // 3*9 + 0 vs 3*7 + 9 (+ cost bonus)
    assert!((router.score(opus, &request) - 27.0).abs() < 1e-9);
    assert!((router.score(pro, &request) - (30.0 + 0.065)).abs() < 1e-9);

    let candidates = router.select_candidates(&request).unwrap();
    assert_eq!(candidates[0].provider(), "google");
}

#[test]
fn test_hard_constraints_filter() {
    let router = router();

    // No required capabilities, so the cost bonus alone orders these

    let cheap = CompletionRequest::new(serde_json::Value::Null).with_max_cost(0.01);
    assert_eq!(
        names(&router.select_candidates(&cheap).unwrap()),
        ["local", "openai", "google"]
    );

    let fast = CompletionRequest::new(serde_json::Value::Null).with_max_latency_ms(1_000);
    assert_eq!(
        names(&router.select_candidates(&fast).unwrap()),
        ["local", "openai"]
    );
}

#[test]
fn test_min_context_selects_single_spec() {
    let request = CompletionRequest::new(serde_json::Value::Null).with_min_context(500_000);
    let candidates = router().select_candidates(&request).unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].model(), "pro");
}

#[test]
fn test_missing_capability_counts_as_zero() {
    let request = CompletionRequest::new(serde_json::Value::Null).require("vision");
    let candidates = router().select_candidates(&request).unwrap();
    assert_eq!(names(&candidates), ["google"]);
}

#[test]
fn test_no_candidate() {
    let request = CompletionRequest::new(serde_json::Value::Null)
        .require("vision")
        .with_max_cost(0.001);

    match router().select_candidates(&request) {
        Err(Error::NoCandidate {
            required,
            considered,
        }) => {
            assert_eq!(required, ["vision"]);
            assert_eq!(considered, 4);
        }
        other => panic!("expected NoCandidate, got {other:?}"),
    }
}

#[test]
fn test_ties_break_on_latency_then_name() {
    let specs = vec![
        ProviderModelSpec::new("zeta", "m")
            .with_capability("chat", 7)
            .with_avg_latency_ms(300),
        ProviderModelSpec::new("beta", "m")
            .with_capability("chat", 7)
            .with_avg_latency_ms(900),
        ProviderModelSpec::new("alpha", "m")
            .with_capability("chat", 7)
            .with_avg_latency_ms(300),
    ];
    let router = CapabilityRouter::new(specs, RoutingRules::default()).unwrap();
    let request = CompletionRequest::new(serde_json::Value::Null).require("chat");

    assert_eq!(
        names(&router.select_candidates(&request).unwrap()),
        ["alpha", "zeta", "beta"]
    );
}

#[test]
fn test_observed_latency_overrides_table() {
    let specs = vec![
        ProviderModelSpec::new("fast", "m")
            .with_capability("chat", 7)
            .with_avg_latency_ms(100),
        ProviderModelSpec::new("slow", "m")
            .with_capability("chat", 7)
            .with_avg_latency_ms(200),
    ];
    let tracker = Arc::new(HealthTracker::default());
    tracker.record_success("fast", 5_000.0, 0.0);

    let router = CapabilityRouter::new(specs, RoutingRules::default())
        .unwrap()
        .with_health(Arc::clone(&tracker));
    let request = CompletionRequest::new(serde_json::Value::Null).require("chat");

    assert_eq!(
        names(&router.select_candidates(&request).unwrap()),
        ["slow", "fast"]
    );

    let bounded = request.with_max_latency_ms(1_000);
    assert_eq!(names(&router.select_candidates(&bounded).unwrap()), ["slow"]);
}

#[test]
fn test_rejects_duplicates_and_bad_scores() {
    let mut specs = table();
    specs.push(specs[0].clone());
    assert!(CapabilityRouter::new(specs, RoutingRules::default()).is_err());

    let bad = vec![ProviderModelSpec::new("x", "y").with_capability("chat", 0)];
    assert!(CapabilityRouter::new(bad, RoutingRules::default()).is_err());

    let rules = RoutingRules::default().with_min_capability_score(11);
    assert!(CapabilityRouter::new(table(), rules).is_err());
}

#[test]
fn test_providers_are_distinct_and_sorted() {
    assert_eq!(
        router().providers(),
        ["anthropic", "google", "local", "openai"]
    );
}

#[test]
fn test_spec_deserializes_from_toml() {
    let spec: ProviderModelSpec = toml::from_str(
        r#"
        provider = "acme"
        model = "acme-1"
        cost_per_1k_tokens = 0.5
        max_context = 4096
        capabilities = { chat = 8 }
        "#,
    )
    .unwrap();
    assert_eq!(spec.capability_score("chat"), 8);
    assert_eq!(spec.capability_score("vision"), 0);
    assert_eq!(spec.avg_latency_ms, 0);
}
