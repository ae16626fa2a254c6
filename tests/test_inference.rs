mod common;

#[cfg(test)]
mod test_inference {
    use super::common::{engine, exact, variance};
    use socialbayes::network::NetworkError;
    use socialbayes::network::inference::{Evidence, InferenceMode, Query};
    use std::sync::atomic::AtomicBool;

    const POLITICS: usize = 1;
    const YES: usize = 1;

    #[test]
    fn test_conditioning_on_topic_informs_poster() {
        let engine = engine("three_friends", 1, 1);
        let evidence = [Evidence::single("Topic1", POLITICS)];
        let p = engine
            .estimate(&evidence, "Interest1", POLITICS, 20_000, InferenceMode::Condition)
            .unwrap();
        assert!((p - 0.8).abs() < 0.03, "conditioned estimate {}", p);
    }

    #[test]
    fn test_intervening_on_topic_leaves_poster_at_prior() {
        let engine = engine("three_friends", 1, 1);
        let evidence = [Evidence::single("Topic1", POLITICS)];
        let p = engine
            .estimate(&evidence, "Interest1", POLITICS, 20_000, InferenceMode::Intervention)
            .unwrap();
        assert!((p - 0.5).abs() < 0.03, "intervened estimate {}", p);
    }

    #[test]
    fn test_estimates_match_exact_enumeration() {
        let engine = engine("three_friends", 5, 1);
        let cases = [
            (
                Evidence::assemble(&[Evidence::single("Topic1", POLITICS), Evidence::single("Comment1", YES)]).unwrap(),
                "Interest2",
                POLITICS,
                InferenceMode::Condition,
            ),
            (Evidence::single("Topic1", POLITICS), "Comment1", YES, InferenceMode::Intervention),
            (Evidence::single("Topic1", POLITICS), "Comment1", YES, InferenceMode::Condition),
            (Evidence::single("Comment4", YES), "Interest3", POLITICS, InferenceMode::Condition),
            (Evidence::single("Interest2", 0), "Comment4", YES, InferenceMode::Intervention),
        ];
        for (evidence, site, value, mode) in cases {
            let expected = exact(&engine, &evidence, mode, site, value);
            let p = engine
                .estimate(&[evidence.clone()], site, value, 20_000, mode)
                .unwrap();
            assert!(
                (p - expected).abs() < 0.03,
                "P({}={} | {} {}) estimated {} expected {}",
                site,
                value,
                mode,
                evidence,
                p,
                expected
            );
        }
    }

    #[test]
    fn test_condition_and_intervention_diverge_on_ancestors_only() {
        let engine = engine("three_friends", 2, 1);
        let topic = Evidence::single("Topic1", POLITICS);
        let conditioned = exact(&engine, &topic, InferenceMode::Condition, "Interest1", POLITICS);
        let intervened = exact(&engine, &topic, InferenceMode::Intervention, "Interest1", POLITICS);
        assert!((conditioned - 0.8).abs() < 1e-9);
        assert!((intervened - 0.5).abs() < 1e-9);

        // A root has no parents to cut, so both modes agree on its descendants.
        let root = Evidence::single("Interest2", 0);
        let a = exact(&engine, &root, InferenceMode::Condition, "Comment4", YES);
        let b = exact(&engine, &root, InferenceMode::Intervention, "Comment4", YES);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_variance_shrinks_with_sample_count() {
        let evidence = [Evidence::single("Comment1", YES)];
        let run = |samples: usize| -> Vec<f64> {
            (0..20)
                .map(|seed| {
                    engine("three_friends", seed, 1)
                        .estimate(&evidence, "Interest2", POLITICS, samples, InferenceMode::Condition)
                        .unwrap()
                })
                .collect()
        };
        let small = run(100);
        let large = run(4_000);
        assert!(variance(&large) < variance(&small));

        let reference = engine("three_friends", 0, 1);
        let expected = exact(&reference, &evidence[0], InferenceMode::Condition, "Interest2", POLITICS);
        let mean = large.iter().sum::<f64>() / large.len() as f64;
        assert!((mean - expected).abs() < 0.02, "mean {} expected {}", mean, expected);
    }

    #[test]
    fn test_seeded_runs_are_reproducible_across_threads() {
        let evidence = [Evidence::single("Topic2", POLITICS)];
        let first = engine("three_friends", 99, 4)
            .estimate(&evidence, "Comment3", YES, 3_000, InferenceMode::Condition)
            .unwrap();
        let second = engine("three_friends", 99, 4)
            .estimate(&evidence, "Comment3", YES, 3_000, InferenceMode::Condition)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_estimate_agrees_with_exact() {
        let engine = engine("three_friends", 3, 4);
        let evidence = Evidence::single("Comment2", YES);
        let expected = exact(&engine, &evidence, InferenceMode::Condition, "Interest3", POLITICS);
        let p = engine
            .estimate(&[evidence], "Interest3", POLITICS, 20_000, InferenceMode::Condition)
            .unwrap();
        assert!((p - expected).abs() < 0.03, "estimated {} expected {}", p, expected);
    }

    #[test]
    fn test_errors_name_the_offender() {
        let engine = engine("three_friends", 0, 1);
        assert!(matches!(
            engine.estimate(&[], "Interest1", POLITICS, 0, InferenceMode::Condition),
            Err(NetworkError::SampleSize(0))
        ));
        assert!(matches!(
            engine.estimate(&[Evidence::single("Topic9", 1)], "Interest1", POLITICS, 10, InferenceMode::Condition),
            Err(NetworkError::UnknownSite(ref name)) if name == "Topic9"
        ));
        assert!(matches!(
            engine.estimate(&[], "Connection1_2", 3, 10, InferenceMode::Condition),
            Err(NetworkError::Domain { ref site, .. }) if site == "Connection1_2"
        ));
        assert!(matches!(
            engine.estimate(&[Evidence::single("Comment1", 2)], "Interest1", 0, 10, InferenceMode::Intervention),
            Err(NetworkError::Domain { ref site, .. }) if site == "Comment1"
        ));
    }

    #[test]
    fn test_batch_reports_and_cancels() {
        let engine = engine("three_friends", 4, 2);
        let query = Query {
            evidence: vec![Evidence::single("Topic1", POLITICS)],
            site: "Interest1".to_string(),
            value: POLITICS,
            samples: 500,
            mode: InferenceMode::Intervention,
        };
        let estimates = engine
            .run_batch(&[query.clone(), query.clone()], &AtomicBool::new(false))
            .unwrap();
        assert_eq!(estimates.len(), 2);
        assert_eq!(estimates[0].probability, estimates[1].probability);
        assert_eq!(estimates[0].label, "politics");
        // Interventions carry no weight, so every sample counts fully.
        assert!((estimates[0].effective_sample_size - 500.0).abs() < 1e-6);

        let cancelled = engine.run_batch(&[query], &AtomicBool::new(true));
        assert!(matches!(cancelled, Err(NetworkError::Cancelled)));
    }
}
