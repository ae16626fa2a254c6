use anyhow::{Context, Result, anyhow};
use log::info;
use socialbayes::network::common::report::{estimate_json, render_estimate, render_realization};
use socialbayes::network::common::setup::{CommandLineOptions, StorageType, parse_configuration_options};
use socialbayes::network::graphdb::GraphRecordStore;
use socialbayes::network::inference::{EngineConfig, InferenceEngine, Query};
use socialbayes::network::model::registry::Registry;
use socialbayes::network::records::{RecordSet, RecordSink, RecordSource};
use socialbayes::network::scenarios::factory::ScenarioMakerFactory;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn load_records(options: &CommandLineOptions) -> Result<Box<dyn RecordSource>> {
    let scenario = ScenarioMakerFactory::new_shared(&options.scenario_name)?;
    match options.storage_type {
        StorageType::InMemory => {
            let mut records = RecordSet::new();
            scenario.setup_scenario(&mut records)?;
            Ok(Box::new(records))
        }
        StorageType::Persistent => {
            let path = options
                .db_path
                .as_deref()
                .ok_or_else(|| anyhow!("--db_path is required with persistent storage"))?;
            let mut store = GraphRecordStore::new_with_file(path, &options.scenario_name)?;
            if store.persons()?.is_empty() {
                scenario.setup_scenario(&mut store as &mut dyn RecordSink)?;
            } else {
                info!("reusing records of {} in {}", options.scenario_name, path);
            }
            Ok(Box::new(store))
        }
    }
}

fn load_registry(options: &CommandLineOptions) -> Result<Registry> {
    match &options.registry {
        Some(path) => Registry::load_from_file(path),
        None => Registry::standard().context("standard tables failed validation"),
    }
}

fn main() -> Result<()> {
    let options = parse_configuration_options()?;
    let registry = Arc::new(load_registry(&options)?);
    let records = load_records(&options)?;
    let config = EngineConfig {
        seed: options.seed,
        workers: options.workers,
    };
    let engine = InferenceEngine::new(registry, &*records, config)?;

    let Some(name) = &options.query else {
        println!("{}", render_realization(engine.skeleton()));
        return Ok(());
    };
    let site = engine.infer(name)?;
    let target = options
        .target
        .as_deref()
        .ok_or_else(|| anyhow!("--target is required with --query"))?;
    let value = engine
        .skeleton()
        .site(&site)
        .and_then(|s| s.domain.iter().position(|label| label == target))
        .ok_or_else(|| anyhow!("'{}' is not a label of {}", target, site))?;
    let evidence = options
        .evidence
        .iter()
        .map(|(name, label)| engine.observe(name, label))
        .collect::<Result<Vec<_>, _>>()?;

    let query = Query {
        evidence,
        site,
        value,
        samples: options.samples,
        mode: options.mode,
    };
    let estimate = engine.run_query(&query, &AtomicBool::new(false))?;
    if options.json {
        println!("{}", estimate_json(std::slice::from_ref(&estimate))?);
    } else {
        println!("{}", render_estimate(&estimate));
    }
    Ok(())
}
