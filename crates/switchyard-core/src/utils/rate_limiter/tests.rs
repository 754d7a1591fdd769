
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test(start_paused = true)]
    async fn test_bucket_starts_full_and_drains() {
        let bucket = TokenBucket::new(TokenBucketConfig::new(1.0, 3.0));

        for _ in 0..3 {
            assert!(bucket.try_acquire(1.0).granted);
        }

        let denied = bucket.try_acquire(1.0);
        assert!(!denied.granted);
        assert_eq!(denied.wait, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_duration_is_deficit_over_rate() {
        let bucket = TokenBucket::new(TokenBucketConfig::new(2.0, 4.0));
        assert!(bucket.try_acquire(4.0).granted);

        // 3 tokens short at 2 tokens/s
        let denied = bucket.try_acquire(3.0);
        assert!(!denied.granted);
        assert_eq!(denied.wait, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_lazy_and_capped() {
        let bucket = TokenBucket::new(TokenBucketConfig::new(1.0, 5.0));
        assert!(bucket.try_acquire(5.0).granted);
        assert_eq!(bucket.available(), 0.0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!((bucket.available() - 2.0).abs() < 1e-9);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(bucket.available(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_stay_within_bounds() {
        let config = TokenBucketConfig::new(3.0, 7.0);
        let bucket = TokenBucket::new(config);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            if rng.gen_bool(0.4) {
                tokio::time::advance(Duration::from_millis(rng.gen_range(0..2_000))).await;
            }
            let needed = rng.gen_range(0.1..9.0);
            let _ = bucket.try_acquire(needed);

            let tokens = bucket.available();
            assert!(tokens >= 0.0, "tokens went negative: {tokens}");
            assert!(tokens <= config.max_tokens, "tokens exceeded capacity: {tokens}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_have_separate_buckets() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(1.0, 2.0));

        assert!(limiter.try_acquire("alpha", 2.0).granted);
        assert!(!limiter.try_acquire("alpha", 1.0).granted);

        assert!(limiter.try_acquire("beta", 2.0).granted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_override() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(1.0, 1.0))
            .with_provider("bulk", TokenBucketConfig::new(10.0, 50.0));

        assert_eq!(limiter.config_for("bulk").max_tokens, 50.0);
        assert_eq!(limiter.config_for("other").max_tokens, 1.0);
        assert_eq!(limiter.available("bulk"), 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(1.0, 1.0));
        let cancel = CancellationToken::new();

        assert_ok!(limiter.acquire("p", 1.0, None, &cancel).await);

        let start = Instant::now();
        let waited = assert_ok!(limiter.acquire("p", 1.0, None, &cancel).await);
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(waited >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(0.1, 1.0));
        let cancel = CancellationToken::new();

        assert_ok!(limiter.acquire("p", 1.0, None, &cancel).await);

        let err = assert_err!(
            limiter
                .acquire("p", 1.0, Some(Duration::from_secs(2)), &cancel)
                .await
        );
        assert!(matches!(err, Error::AcquireTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_rejects_oversized_request() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(1.0, 2.0));
        let cancel = CancellationToken::new();

        let err = assert_err!(limiter.acquire("p", 3.0, None, &cancel).await);
        assert!(matches!(err, Error::ExceedsCapacity { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_rejects_non_positive_tokens() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(1.0, 2.0));
        let cancel = CancellationToken::new();

        for tokens in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = assert_err!(limiter.acquire("p", tokens, None, &cancel).await);
            assert!(matches!(err, Error::InvalidConfig { .. }));
        }
        assert_eq!(limiter.available("p"), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_observes_cancellation() {
        let limiter = RateLimiter::new(TokenBucketConfig::new(0.01, 1.0));
        let cancel = CancellationToken::new();
        assert_ok!(limiter.acquire("p", 1.0, None, &cancel).await);

        cancel.cancel();
        let err = assert_err!(limiter.acquire("p", 1.0, None, &cancel).await);
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenBucketConfig::default().validate("p").is_ok());
        assert!(TokenBucketConfig::new(0.0, 1.0).validate("p").is_err());
        assert!(TokenBucketConfig::new(1.0, -1.0).validate("p").is_err());
        assert!(TokenBucketConfig::new(f64::NAN, 1.0).validate("p").is_err());
    }

    #[test]
    fn test_per_minute() {
        let config = TokenBucketConfig::per_minute(120);
        assert_eq!(config.tokens_per_second, 2.0);
        assert_eq!(config.max_tokens, 120.0);
    }
