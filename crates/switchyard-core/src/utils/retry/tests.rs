
    use super::*;

    #[test]
    fn test_backoff_defaults() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.max_jitter, Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_builder() {
        let policy = BackoffPolicy::new()
            .with_max_retries(5)
            .with_base_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(10))
            .with_max_jitter(Duration::ZERO);

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
        assert_eq!(policy.max_jitter, Duration::ZERO);
    }

    #[test]
    fn test_computed_delay_doubles() {
        let policy = BackoffPolicy::new().with_base_delay(Duration::from_millis(100));

        assert_eq!(policy.computed_delay(0), Duration::from_millis(100));
        assert_eq!(policy.computed_delay(1), Duration::from_millis(200));
        assert_eq!(policy.computed_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_respects_max() {
        let policy = BackoffPolicy::new()
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5));

        // 1 * 2^10 = 1024 seconds, but max is 5 seconds
        assert_eq!(policy.computed_delay(10), Duration::from_secs(5));
        assert_eq!(policy.computed_delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = BackoffPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_max_jitter(Duration::from_secs(1));

        for _ in 0..200 {
            let delay = policy.delay_for(0, None, Duration::ZERO);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_explicit_retry_after_wins() {
        let policy = BackoffPolicy::new();
        assert_eq!(
            policy.delay_for(2, Some(Duration::from_secs(5)), Duration::from_secs(9)),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_for(0, Some(Duration::ZERO), Duration::from_secs(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_floor_raises_early_delays_then_backoff_grows() {
        let policy = BackoffPolicy::new()
            .with_base_delay(Duration::from_secs(2))
            .with_max_jitter(Duration::ZERO);
        let floor = Duration::from_secs(5);

        assert_eq!(policy.delay_for(0, None, floor), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1, None, floor), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2, None, floor), Duration::from_secs(8));
        assert_eq!(policy.delay_for(3, None, floor), Duration::from_secs(16));
    }

    #[test]
    fn test_jitter_applies_above_floor() {
        let policy = BackoffPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_max_jitter(Duration::from_secs(1));
        let floor = Duration::from_secs(5);

        let delays: Vec<Duration> = (0..50).map(|_| policy.delay_for(0, None, floor)).collect();
        assert!(delays
            .iter()
            .all(|d| *d >= floor && *d <= floor + Duration::from_secs(1)));
        assert!(delays.iter().any(|d| *d != delays[0]));
    }

    #[test]
    fn test_can_retry() {
        let policy = BackoffPolicy::new().with_max_retries(2);
        assert!(policy.can_retry(0));
        assert!(policy.can_retry(1));
        assert!(!policy.can_retry(2));
    }
