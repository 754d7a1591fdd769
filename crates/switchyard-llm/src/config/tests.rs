
    use super::*;
    use switchyard_core::CircuitState;

    const SAMPLE: &str = r#"
        [executor]
        max_retries_per_candidate = 2
        base_delay_ms = 250
        acquire_timeout_ms = 5000

        [routing]
        min_capability_score = 6

        [providers.acme]
        tokens_per_second = 2.5
        max_tokens = 20
        failure_threshold = 3
        cool_down_seconds = 30
        rate_limit_default_seconds = 15

        [[models]]
        provider = "acme"
        model = "acme-large"
        cost_per_1k_tokens = 0.03
        max_context = 200000
        avg_latency_ms = 1200
        capabilities = { reasoning = 9, coding = 8 }

        [[models]]
        provider = "beta"
        model = "beta-fast"
        cost_per_1k_tokens = 0.002
        max_context = 32000
        avg_latency_ms = 300
        capabilities = { coding = 6 }
    "#;

    fn sample() -> SwitchyardConfig {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = sample();
        assert_eq!(config.executor.max_retries_per_candidate, 2);
        assert_eq!(config.executor.max_delay_ms, 30_000);
        assert_eq!(config.executor.max_jitter_ms, 1_000);
        assert_eq!(config.routing.min_capability_score, 6);
        assert_eq!(config.routing.required_weight, 3.0);
        assert_eq!(config.health, HealthSettings::default());
        assert_eq!(config.idempotency.retention_seconds, 3_600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_defaults_apply_to_unlisted_providers() {
        let config = sample();
        let beta = config.provider("beta");
        assert_eq!(beta, ProviderSettings::default());
        assert_eq!(
            config.provider_names().into_iter().collect::<Vec<_>>(),
            ["acme", "beta"]
        );
    }

    #[test]
    fn test_conversions() {
        let config = sample();

        let executor = config.executor_config();
        assert_eq!(executor.backoff.max_retries, 2);
        assert_eq!(executor.backoff.base_delay, Duration::from_millis(250));
        assert_eq!(executor.acquire_timeout, Some(Duration::from_secs(5)));
        assert!(executor.attempt_timeout.is_none());

        let limiter = config.rate_limiter();
        assert_eq!(limiter.config_for("acme").max_tokens, 20.0);
        assert_eq!(limiter.config_for("beta").max_tokens, 10.0);

        let tracker = config.health_tracker();
        assert_eq!(tracker.breaker_config_for("acme").failure_threshold, 3);
        assert_eq!(
            tracker.breaker_config_for("acme").cool_down,
            Duration::from_secs(30)
        );
        assert_eq!(tracker.breaker_config_for("beta").failure_threshold, 5);
        assert_eq!(tracker.circuit_state("acme"), CircuitState::Closed);

        let classifier = config.classifier();
        assert_eq!(
            classifier.rate_limit_default_for("acme"),
            Duration::from_secs(15)
        );
        assert_eq!(
            classifier.rate_limit_default_for("beta"),
            Duration::from_secs(60)
        );

        let router = config.router().unwrap();
        assert_eq!(router.specs().len(), 2);
        assert_eq!(router.reference_cost(), 0.03);
    }

    #[test]
    fn test_rejects_bad_capability_score() {
        let mut config = sample();
        config.models[0].capabilities.insert("vision".to_string(), 11);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { field, .. }) if field.ends_with("capabilities")
        ));
    }

    #[test]
    fn test_rejects_duplicate_models() {
        let mut config = sample();
        let duplicate = config.models[0].clone();
        config.models.push(duplicate);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_threshold_and_rates() {
        let mut config = sample();
        config.providers.get_mut("acme").unwrap().failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.providers.get_mut("acme").unwrap().tokens_per_second = 0.0;
        assert!(matches!(config.validate(), Err(Error::Core(_))));
    }

    #[test]
    fn test_rejects_request_larger_than_bucket() {
        let mut config = sample();
        config.executor.rate_tokens_per_request = 15.0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { field, .. }) if field == "providers.beta.max_tokens"
        ));
    }

    #[test]
    fn test_rejects_empty_model_table() {
        let config = SwitchyardConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_executor_builder_needs_adapters() {
        let config = sample();
        let result = config.executor_builder().unwrap().build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
