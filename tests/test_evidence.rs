mod common;

#[cfg(test)]
mod test_evidence {
    use super::common::engine;
    use proptest::prelude::*;
    use socialbayes::network::inference::{Evidence, InferenceMode, assemble_evidence};
    use socialbayes::network::{NetworkError, Observable};

    #[test]
    fn test_assemble_merges_distinct_sites() {
        let merged = assemble_evidence(&[Evidence::single("Topic1", 1), Evidence::single("Comment1", 1)]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("Topic1"), Some(1));
        assert_eq!(merged.get("Comment1"), Some(1));
    }

    #[test]
    fn test_assemble_rejects_contradiction() {
        let err = assemble_evidence(&[Evidence::single("Topic1", 1), Evidence::single("Topic1", 0)]).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Conflict { ref site, first: 1, second: 0 } if site == "Topic1"
        ));
        // Repeating the same observation is not a contradiction.
        assert!(assemble_evidence(&[Evidence::single("Topic1", 1), Evidence::single("Topic1", 1)]).is_ok());
    }

    #[test]
    fn test_observe_uses_entity_trace_names() {
        let engine = engine("three_friends", 0, 1);
        let skeleton = engine.skeleton();
        let bob = skeleton.entity("Bob").unwrap();
        assert_eq!(bob.infer(), "Interest2");
        assert_eq!(bob.observe("sports").unwrap().get("Interest2"), Some(0));
        let comment = skeleton.entity("Comment4").unwrap();
        assert_eq!(comment.observe_value(1).unwrap().get("Comment4"), Some(1));
        assert!(matches!(comment.observe_value(2), Err(NetworkError::Domain { .. })));
        let connection = skeleton.entity("Connection3_2").unwrap();
        assert_eq!(connection.observe("close friend").unwrap().get("Connection3_2"), Some(1));
    }

    #[test]
    fn test_forcing_the_query_gives_certainty() {
        let engine = engine("three_friends", 0, 1);
        for mode in [InferenceMode::Condition, InferenceMode::Intervention] {
            let p = engine
                .estimate(&[Evidence::single("Topic2", 0)], "Topic2", 0, 200, mode)
                .unwrap();
            assert_eq!(p, 1.0);
        }
    }

    proptest! {
        #[test]
        fn prop_observe_closed_over_domain(entity in prop::sample::select(vec![
            "Alice", "Bob", "Carol", "Post1", "Post3", "Comment2", "Connection1_2", "Connection2_1",
        ]), label in "[a-z ]{0,14}") {
            let engine = engine("three_friends", 0, 1);
            let entity = engine.skeleton().entity(entity).unwrap();
            let in_domain = entity.domain().iter().any(|l| *l == label);
            match entity.observe(&label) {
                Ok(evidence) => {
                    prop_assert!(in_domain);
                    prop_assert_eq!(evidence.len(), 1);
                }
                Err(NetworkError::Domain { site, .. }) => {
                    prop_assert!(!in_domain);
                    prop_assert_eq!(site, entity.infer());
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
            for valid in entity.domain() {
                prop_assert!(entity.observe(valid).is_ok());
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_evidence_on_prior_mode_never_lowers_it(
            comments in prop::collection::vec((1u64..=4, 0usize..2), 0..3),
            seed in 0u64..1_000,
        ) {
            // Comment*=no is the prior-most-likely value of every comment.
            let engine = engine("three_friends", seed, 1);
            let mut observations: Vec<Evidence> = Vec::new();
            for (id, value) in comments {
                let candidate = Evidence::single(format!("Comment{}", id), value);
                let mut trial = observations.clone();
                trial.push(candidate);
                if assemble_evidence(&trial).is_ok() {
                    observations = trial;
                }
            }
            let site = "Comment1";
            if assemble_evidence(&observations).unwrap().get(site).is_some_and(|v| v != 0) {
                return Ok(());
            }
            let before = engine.estimate(&observations, site, 0, 300, InferenceMode::Condition).unwrap();
            observations.push(Evidence::single(site, 0));
            let after = engine.estimate(&observations, site, 0, 300, InferenceMode::Condition).unwrap();
            prop_assert_eq!(after, 1.0);
            prop_assert!(after >= before);
        }
    }
}
