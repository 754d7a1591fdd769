use crate::loader::load_config;
use std::path::Path;
use switchyard_llm::SwitchyardConfig;
use tracing::info;

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    info!(
        providers = config.provider_names().len(),
        models = config.models.len(),
        "Configuration loaded"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    print!("{}", summarize(&config));
    Ok(())
}

fn summarize(config: &SwitchyardConfig) -> String {
    let mut output = String::new();
    let e = &config.executor;

    output.push_str("Configuration OK\n\n");
    output.push_str(&format!(
        "Executor: {} retries/candidate, backoff {}ms..{}ms (+{}ms jitter), acquire timeout {}\n",
        e.max_retries_per_candidate,
        e.base_delay_ms,
        e.max_delay_ms,
        e.max_jitter_ms,
        e.acquire_timeout_ms
            .map_or_else(|| "none".to_string(), |ms| format!("{ms}ms")),
    ));
    output.push_str(&format!(
        "Routing: min score {}, weights required={} preferred={} cost={}\n",
        config.routing.min_capability_score,
        config.routing.required_weight,
        config.routing.preferred_weight,
        config.routing.cost_weight,
    ));

    output.push_str("\nProviders:\n");
    for name in config.provider_names() {
        let p = config.provider(name);
        let explicit = if config.providers.contains_key(name) {
            ""
        } else {
            " (defaults)"
        };
        output.push_str(&format!(
            "  {name}: {}/s burst {}, opens after {} failures for {}s{explicit}\n",
            p.tokens_per_second, p.max_tokens, p.failure_threshold, p.cool_down_seconds,
        ));
    }

    output.push_str("\nModels:\n");
    for spec in &config.models {
        let capabilities: Vec<String> = spec
            .capabilities
            .iter()
            .map(|(tag, score)| format!("{tag}={score}"))
            .collect();
        output.push_str(&format!(
            "  {:<28} ${:.4}/1k  ctx {:>7}  ~{}ms  [{}]\n",
            spec.label(),
            spec.cost_per_1k_tokens,
            spec.max_context,
            spec.avg_latency_ms,
            capabilities.join(", "),
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_marks_default_providers() {
        let config: SwitchyardConfig = toml::from_str(
            r#"
            [providers.acme]
            tokens_per_second = 2.0

            [[models]]
            provider = "acme"
            model = "large"
            capabilities = { coding = 8 }

            [[models]]
            provider = "beta"
            model = "small"
            "#,
        )
        .unwrap();

        let summary = summarize(&config);
        assert!(summary.contains("acme: 2/s"));
        assert!(summary.contains("beta: 1/s burst 10, opens after 5 failures for 60s (defaults)"));
        assert!(summary.contains("coding=8"));
    }
}
