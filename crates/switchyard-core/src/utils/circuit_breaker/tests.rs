
    use super::*;

    fn breaker(threshold: u32, cool_down_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_cool_down(Duration::from_secs(cool_down_secs)),
        )
    }

    #[test]
    fn test_circuit_breaker_config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.cool_down, Duration::from_secs(60));
    }

    #[test]
    fn test_circuit_breaker_initial_state() {
        let cb = CircuitBreaker::with_defaults("test");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.admit(), Admission::Allowed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.opened_at().is_none());
    }

    #[test]
    fn test_opens_after_exactly_threshold_failures() {
        let cb = breaker(3, 60);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.opened_at().is_some());
        assert!(!cb.admit().is_allowed());
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let cb = breaker(3, 60);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.consecutive_failures(), 2);

        cb.record_success();
        assert_eq!(cb.consecutive_failures(), 0);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_rejects_until_cool_down() {
        let cb = breaker(1, 60);
        cb.record_failure();

        match cb.admit() {
            Admission::Rejected { retry_in } => assert_eq!(retry_in, Duration::from_secs(60)),
            other => panic!("expected rejection, got {other:?}"),
        }

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!cb.admit().is_allowed());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cb.admit(), Admission::Trial);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_allows_single_trial() {
        let cb = breaker(1, 10);
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cb.admit(), Admission::Trial);
        assert_eq!(
            cb.admit(),
            Admission::Rejected {
                retry_in: Duration::ZERO
            }
        );

        cb.release_trial();
        assert_eq!(cb.admit(), Admission::Trial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_success_closes() {
        let cb = breaker(2, 10);
        cb.record_failure();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cb.admit(), Admission::Trial);
        cb.record_success();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert_eq!(cb.admit(), Admission::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_failure_reopens_and_restarts_cool_down() {
        let cb = breaker(1, 10);
        cb.record_failure();
        let first_opened = cb.opened_at();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cb.admit(), Admission::Trial);
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.opened_at() > first_opened);
        assert!(!cb.admit().is_allowed());
    }

    #[test]
    fn test_late_success_does_not_close_open_circuit() {
        let cb = breaker(1, 60);
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_circuit_breaker_reset() {
        let cb = breaker(2, 60);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.admit(), Admission::Allowed);
    }

    #[test]
    fn test_circuit_state_display() {
        assert_eq!(format!("{}", CircuitState::Closed), "Closed");
        assert_eq!(format!("{}", CircuitState::Open), "Open");
        assert_eq!(format!("{}", CircuitState::HalfOpen), "HalfOpen");
    }
