use super::RouteArgs;
use crate::loader::load_config;
use anyhow::Context;
use std::path::Path;
use switchyard_llm::{CompletionRequest, ScoredCandidate};

pub fn run(config_path: Option<&Path>, args: &RouteArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let router = config.router().context("Failed to build router")?;
    let request = request_for(args);

    let candidates = router.select_candidates(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    print!("{}", format_candidates(&candidates));
    Ok(())
}

fn request_for(args: &RouteArgs) -> CompletionRequest {
    let mut request = CompletionRequest::new(serde_json::Value::Null);
    for tag in &args.require {
        request = request.require(tag.as_str());
    }
    for tag in &args.prefer {
        request = request.prefer(tag.as_str());
    }
    if let Some(cost) = args.max_cost {
        request = request.with_max_cost(cost);
    }
    if let Some(latency) = args.max_latency_ms {
        request = request.with_max_latency_ms(latency);
    }
    if let Some(context) = args.min_context {
        request = request.with_min_context(context);
    }
    request
}

fn format_candidates(candidates: &[ScoredCandidate]) -> String {
    let mut output = format!("{} candidate(s), in dispatch order:\n", candidates.len());
    for (rank, candidate) in candidates.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {:<28} score {:>7.3}  ${:.4}/1k  ~{:.0}ms\n",
            rank + 1,
            candidate.spec.label(),
            candidate.score,
            candidate.spec.cost_per_1k_tokens,
            candidate.latency_ms,
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(require: &[&str]) -> RouteArgs {
        RouteArgs {
            require: require.iter().map(|s| s.to_string()).collect(),
            prefer: vec!["vision".to_string()],
            max_cost: Some(0.02),
            max_latency_ms: None,
            min_context: Some(100_000),
            json: false,
        }
    }

    #[test]
    fn test_request_carries_constraints() {
        let request = request_for(&args(&["coding", "reasoning"]));
        assert_eq!(request.required.len(), 2);
        assert!(request.preferred.contains("vision"));
        assert_eq!(request.constraints.max_cost_per_1k, Some(0.02));
        assert_eq!(request.constraints.min_context, Some(100_000));
        assert_eq!(request.constraints.max_latency_ms, None);
    }

    #[test]
    fn test_format_numbers_candidates() {
        let candidates = vec![ScoredCandidate {
            spec: switchyard_llm::ProviderModelSpec::new("acme", "large").with_cost_per_1k(0.01),
            score: 24.5,
            latency_ms: 800.0,
        }];
        let text = format_candidates(&candidates);
        assert!(text.starts_with("1 candidate(s)"));
        assert!(text.contains("1. acme/large"));
    }
}
