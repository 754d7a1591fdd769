
    use super::*;

    fn classify(error: ProviderError) -> ClassifiedError {
        ErrorClassifier::new().classify("acme", &error)
    }

    #[test]
    fn test_rate_limit_uses_header() {
        let c = classify(ProviderError::http(429, "slow down").with_retry_after("5"));
        assert_eq!(c.category, ErrorCategory::RateLimit);
        assert!(c.should_retry);
        assert_eq!(c.retry_after, Some(Duration::from_secs(5)));
        assert_eq!(c.min_delay, Duration::from_secs(60));
        assert!(!c.needs_credential_refresh);
    }

    #[test]
    fn test_rate_limit_defaults_per_provider() {
        let classifier = ErrorClassifier::new()
            .with_provider_rate_limit_default("acme", Duration::from_secs(20));

        let err = ProviderError::http(429, "slow down");
        let acme = classifier.classify("acme", &err);
        assert!(acme.retry_after.is_none());
        assert_eq!(acme.min_delay, Duration::from_secs(20));
        assert_eq!(
            classifier.classify("other", &err).min_delay,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_rate_limit_from_text_and_hint() {
        let c = classify(ProviderError::other(
            "Rate limit reached for requests. Please retry after 12 seconds.",
        ));
        assert_eq!(c.category, ErrorCategory::RateLimit);
        assert_eq!(c.retry_after, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_auth_requires_refresh() {
        for status in [401, 403] {
            let c = classify(ProviderError::http(status, "nope"));
            assert_eq!(c.category, ErrorCategory::Auth);
            assert!(c.should_retry);
            assert!(c.needs_credential_refresh);
        }

        let c = classify(ProviderError::other("Invalid API key provided"));
        assert_eq!(c.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_server_errors() {
        for status in [500, 502, 503, 529] {
            let c = classify(ProviderError::http(status, "upstream"));
            assert_eq!(c.category, ErrorCategory::Server, "status {status}");
            assert!(c.retry_after.is_none());
            assert_eq!(c.min_delay, Duration::from_secs(5));
        }
    }

    #[test]
    fn test_transient_errors() {
        let c = classify(ProviderError::timeout("deadline elapsed"));
        assert_eq!(c.category, ErrorCategory::Transient);
        assert!(c.retry_after.is_none());
        assert_eq!(c.min_delay, Duration::from_secs(1));

        let c = classify(ProviderError::connection("connection reset by peer"));
        assert_eq!(c.category, ErrorCategory::Transient);

        let c = classify(ProviderError::http(408, "request timeout"));
        assert_eq!(c.category, ErrorCategory::Transient);
    }

    #[test]
    fn test_parse_errors_retry_without_delay() {
        let c = classify(ProviderError::decode("expected value at line 1 column 1"));
        assert_eq!(c.category, ErrorCategory::Parse);
        assert!(c.should_retry);
        assert_eq!(c.retry_after, Some(Duration::ZERO));
    }

    #[test]
    fn test_client_errors_do_not_retry() {
        let c = classify(ProviderError::http(400, "missing field `messages`"));
        assert_eq!(c.category, ErrorCategory::Client);
        assert!(!c.should_retry);
        assert!(c.retry_after.is_none());

        let c = classify(ProviderError::http(422, "unprocessable"));
        assert_eq!(c.category, ErrorCategory::Client);
    }

    #[test]
    fn test_unknown_errors_are_fatal() {
        let c = classify(ProviderError::other("the model declined to answer"));
        assert_eq!(c.category, ErrorCategory::Fatal);
        assert!(!c.should_retry);
    }

    #[test]
    fn test_status_recovered_from_message() {
        let c = classify(ProviderError::other("upstream returned status: 503"));
        assert_eq!(c.status, Some(503));
        assert_eq!(c.category, ErrorCategory::Server);

        let c = classify(ProviderError::other("HTTP 400 for url"));
        assert_eq!(c.category, ErrorCategory::Client);
    }

    #[test]
    fn test_priority_order() {
        // A 429 that also mentions a timeout is still a rate limit
        let c = classify(ProviderError::timeout("too many requests, timed out"));
        assert_eq!(c.category, ErrorCategory::RateLimit);

        // An explicit 5xx beats the decode hint
        let c = classify(ProviderError::http(502, "failed to parse upstream reply"));
        assert_eq!(c.category, ErrorCategory::Server);
    }

    #[test]
    fn test_classification_is_total() {
        let errors = [
            ProviderError::http(100, ""),
            ProviderError::http(302, "moved"),
            ProviderError::http(418, "teapot"),
            ProviderError::other(""),
            ProviderError::decode(""),
            ProviderError::connection(""),
        ];
        for err in errors {
            let c = classify(err);
            assert_eq!(
                ErrorCategory::ALL
                    .iter()
                    .filter(|cat| **cat == c.category)
                    .count(),
                1
            );
        }
    }

    #[test]
    fn test_trips_circuit() {
        assert!(ErrorCategory::Server.trips_circuit());
        assert!(ErrorCategory::Transient.trips_circuit());
        assert!(ErrorCategory::Parse.trips_circuit());
        assert!(ErrorCategory::Fatal.trips_circuit());
        assert!(!ErrorCategory::RateLimit.trips_circuit());
        assert!(!ErrorCategory::Auth.trips_circuit());
        assert!(!ErrorCategory::Client.trips_circuit());
    }

    #[test]
    fn test_parse_retry_after_formats() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after("soon"), None);

        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );

        let future = (chrono::Utc::now() + chrono::Duration::seconds(30)).to_rfc2822();
        let wait = parse_retry_after(&future).unwrap();
        assert!(wait <= Duration::from_secs(30));
        assert!(wait >= Duration::from_secs(28));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::RateLimit.as_str(), "rate_limit");
        assert_eq!(ErrorCategory::Client.to_string(), "Client");
    }
