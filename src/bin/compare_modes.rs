use anyhow::Result;
use socialbayes::network::common::report::{describe, render_estimate};
use socialbayes::network::common::setup::init_logging;
use socialbayes::network::inference::{EngineConfig, Evidence, InferenceEngine, InferenceMode, Query};
use socialbayes::network::model::registry::Registry;
use socialbayes::network::records::RecordSet;
use socialbayes::network::scenarios::factory::ScenarioMakerFactory;
use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn queries(engine: &InferenceEngine, samples: usize, mode: InferenceMode) -> Result<Vec<Query>> {
    let query = |evidence: Vec<Evidence>, name: &str, label: &str| -> Result<Query> {
        let site = engine.infer(name)?;
        let value = engine.observe(name, label)?.get(&site).unwrap_or_default();
        Ok(Query {
            evidence,
            site,
            value,
            samples,
            mode,
        })
    };
    Ok(vec![
        // Does Alice's post topic tell us about Alice?
        query(vec![engine.observe("Post1", "politics")?], "Alice", "politics")?,
        // Does Bob commenting on Alice's post tell us about Bob?
        query(
            vec![engine.observe("Post1", "politics")?, engine.observe("Comment1", "yes")?],
            "Bob",
            "politics",
        )?,
        // Bob comments on Carol's post given Bob's interest.
        query(vec![engine.observe("Bob", "sports")?], "Comment4", "yes")?,
    ])
}

fn main() -> Result<()> {
    init_logging();
    let scenario_name = env::var("SCENARIO").unwrap_or_else(|_| "three_friends".to_string());
    let samples: usize = env::var("SAMPLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);
    let seed: u64 = env::var("SEED").ok().and_then(|s| s.parse().ok()).unwrap_or(7);

    let mut records = RecordSet::new();
    ScenarioMakerFactory::new_shared(&scenario_name)?.setup_scenario(&mut records)?;
    let config = EngineConfig {
        seed: Some(seed),
        workers: 4,
    };
    let engine = InferenceEngine::new(Arc::new(Registry::standard()?), &records, config)?;

    let cancel = AtomicBool::new(false);
    let conditioned = engine.run_batch(&queries(&engine, samples, InferenceMode::Condition)?, &cancel)?;
    let intervened = engine.run_batch(&queries(&engine, samples, InferenceMode::Intervention)?, &cancel)?;

    println!("===== {} ({} samples, seed {}) =====", scenario_name, samples, seed);
    for (condition, intervention) in conditioned.iter().zip(&intervened) {
        println!("{}", render_estimate(condition));
        println!("{}", render_estimate(intervention));
        println!(
            "  gap {:+.4} between {} and {}\n",
            condition.probability - intervention.probability,
            describe(condition),
            describe(intervention)
        );
    }
    Ok(())
}
