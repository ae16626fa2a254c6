#![allow(dead_code)]

use socialbayes::network::inference::{EngineConfig, Evidence, InferenceEngine, InferenceMode};
use socialbayes::network::model::registry::{EntityKind, Registry};
use socialbayes::network::records::RecordSet;
use socialbayes::network::scenarios::factory::ScenarioMakerFactory;
use std::collections::HashMap;
use std::sync::Arc;

pub fn records(scenario: &str) -> RecordSet {
    let mut records = RecordSet::new();
    ScenarioMakerFactory::new_shared(scenario)
        .unwrap()
        .setup_scenario(&mut records)
        .unwrap();
    records
}

pub fn engine(scenario: &str, seed: u64, workers: usize) -> InferenceEngine {
    let config = EngineConfig {
        seed: Some(seed),
        workers,
    };
    InferenceEngine::new(Arc::new(Registry::standard().unwrap()), &records(scenario), config).unwrap()
}

struct OracleSite {
    kind: EntityKind,
    cardinality: usize,
    parents: Vec<usize>,
    fixed: Option<usize>,
    /// Fixed sites under intervention contribute no factor.
    cut: bool,
}

/// P(site = value | evidence) or P(site = value | do(evidence)) by summing the
/// joint over every assignment of the engine's network.
pub fn exact(engine: &InferenceEngine, evidence: &Evidence, mode: InferenceMode, site: &str, value: usize) -> f64 {
    let skeleton = engine.skeleton();
    let positions: HashMap<&str, usize> = skeleton
        .sites()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();
    let sites: Vec<OracleSite> = skeleton
        .sites()
        .iter()
        .map(|s| {
            let fixed = evidence.get(&s.name);
            let cut = fixed.is_some() && mode == InferenceMode::Intervention;
            OracleSite {
                kind: s.kind,
                cardinality: s.domain.len(),
                parents: s.parents.iter().map(|p| positions[p.as_str()]).collect(),
                fixed,
                cut,
            }
        })
        .collect();
    let query = positions[site];

    let mut assignment = vec![0; sites.len()];
    let mut totals = (0.0, 0.0);
    walk(engine.registry(), &sites, 0, &mut assignment, 1.0, query, value, &mut totals);
    totals.0 / totals.1
}

#[allow(clippy::too_many_arguments)]
fn walk(
    registry: &Registry,
    sites: &[OracleSite],
    index: usize,
    assignment: &mut Vec<usize>,
    weight: f64,
    query: usize,
    value: usize,
    totals: &mut (f64, f64),
) {
    if weight == 0.0 {
        return;
    }
    if index == sites.len() {
        totals.1 += weight;
        if assignment[query] == value {
            totals.0 += weight;
        }
        return;
    }
    let site = &sites[index];
    let candidates: Vec<usize> = match site.fixed {
        Some(v) => vec![v],
        None => (0..site.cardinality).collect(),
    };
    for candidate in candidates {
        let factor = if site.cut {
            1.0
        } else {
            let parent_values: Vec<usize> = site.parents.iter().map(|p| assignment[*p]).collect();
            registry.cpt(site.kind, &parent_values).unwrap()[candidate]
        };
        assignment[index] = candidate;
        walk(registry, sites, index + 1, assignment, weight * factor, query, value, totals);
    }
}

pub fn variance(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}
