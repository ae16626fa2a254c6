use crate::network::common::errors::{NetworkError, NetworkResult};
use crate::network::inference::builder::{Realization, build_realization};
use crate::network::inference::evidence::{Evidence, InferenceMode, SamplingPlan, assemble_evidence};
use crate::network::inference::marginal::EmpiricalMarginal;
use crate::network::model::memo::ConnectionMemo;
use crate::network::model::registry::Registry;
use crate::network::records::{RecordSet, RecordSource};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mixed into the base seed for the resampling stream so it never coincides with
/// a worker's stream.
const RESAMPLE_SALT: u64 = 0x5eed_0f_da7a_5a17;

/// Below this fraction of the sample count the effective sample size is logged
/// as a warning.
const LOW_ESS_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed base seed; `None` draws a fresh one per query.
    pub seed: Option<u64>,
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: None,
            workers: 1,
        }
    }
}

/// One marginal question: P(site = value | evidence) or P(site = value | do(evidence)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub evidence: Vec<Evidence>,
    pub site: String,
    pub value: usize,
    pub samples: usize,
    pub mode: InferenceMode,
}

/// The answer to a `Query` together with its sampling diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub site: String,
    pub value: usize,
    pub label: String,
    pub mode: InferenceMode,
    pub evidence: Evidence,
    pub samples: usize,
    /// Frequency of `value` in the empirical marginal.
    pub probability: f64,
    /// Self-normalised importance estimate, for comparison.
    pub weighted_probability: f64,
    pub effective_sample_size: f64,
    pub seed: u64,
}

/// Runs realizations of the network over a fixed snapshot of the knowledge base.
pub struct InferenceEngine {
    registry: Arc<Registry>,
    records: RecordSet,
    skeleton: Realization,
    config: EngineConfig,
}

impl InferenceEngine {
    /// Snapshots `source` and builds one prior realization to resolve names and
    /// check the records' references.
    pub fn new(registry: Arc<Registry>, source: &dyn RecordSource, config: EngineConfig) -> NetworkResult<Self> {
        let records = RecordSet::snapshot(source)?;
        let mut memo = ConnectionMemo::new();
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
        let skeleton = build_realization(&records, &registry, &SamplingPlan::prior(), &mut memo, &mut rng)?;
        info!(
            "engine ready: {} records, {} sites, {} worker(s)",
            records.len(),
            skeleton.sites().len(),
            config.workers.max(1)
        );
        Ok(InferenceEngine {
            registry,
            records,
            skeleton,
            config,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A realization drawn at construction; its structure (names, sites, parents)
    /// is shared by every realization of this engine.
    pub fn skeleton(&self) -> &Realization {
        &self.skeleton
    }

    /// Evidence binding the named entity, or trace, to `label`.
    pub fn observe(&self, name: &str, label: &str) -> NetworkResult<Evidence> {
        self.skeleton.observe(name, label)
    }

    /// The trace name of the named entity.
    pub fn infer(&self, name: &str) -> NetworkResult<String> {
        self.skeleton.resolve(name)
    }

    /// Builds one realization under `plan` with the caller's rng.
    pub fn realize<R: Rng + ?Sized>(&self, plan: &SamplingPlan, rng: &mut R) -> NetworkResult<Realization> {
        let mut memo = ConnectionMemo::new();
        build_realization(&self.records, &self.registry, plan, &mut memo, rng)
    }

    pub fn prior_realization<R: Rng + ?Sized>(&self, rng: &mut R) -> NetworkResult<Realization> {
        self.realize(&SamplingPlan::prior(), rng)
    }

    /// P(site = value) given `evidence` under `mode`, as a frequency.
    pub fn estimate(
        &self,
        evidence: &[Evidence],
        site: &str,
        value: usize,
        samples: usize,
        mode: InferenceMode,
    ) -> NetworkResult<f64> {
        self.estimate_with_cancel(evidence, site, value, samples, mode, &AtomicBool::new(false))
    }

    pub fn estimate_with_cancel(
        &self,
        evidence: &[Evidence],
        site: &str,
        value: usize,
        samples: usize,
        mode: InferenceMode,
        cancel: &AtomicBool,
    ) -> NetworkResult<f64> {
        let query = Query {
            evidence: evidence.to_vec(),
            site: site.to_string(),
            value,
            samples,
            mode,
        };
        self.run_query(&query, cancel).map(|estimate| estimate.probability)
    }

    /// Answers `query` with diagnostics.
    pub fn run_query(&self, query: &Query, cancel: &AtomicBool) -> NetworkResult<Estimate> {
        if query.samples == 0 {
            return Err(NetworkError::SampleSize(query.samples));
        }
        let evidence = assemble_evidence(&query.evidence)?;
        let domain_size = self.validate(&evidence, &query.site, query.value)?;
        let plan = SamplingPlan::new(evidence.clone(), query.mode);
        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());

        let marginal = self.sample_posterior(&plan, &query.site, domain_size, query.samples, seed, cancel)?;
        let mut resample_rng = StdRng::seed_from_u64(seed ^ RESAMPLE_SALT);
        let probability = marginal.frequency(query.value, query.samples, &mut resample_rng)?;
        let weighted_probability = marginal.weighted_probability(query.value)?;
        let effective_sample_size = marginal.effective_sample_size()?;

        if effective_sample_size < LOW_ESS_FRACTION * query.samples as f64 {
            warn!(
                "effective sample size {:.1} of {} for {} given {}",
                effective_sample_size, query.samples, query.site, evidence
            );
        }
        let label = self
            .skeleton
            .site(&query.site)
            .map(|site| site.domain[query.value].clone())
            .unwrap_or_default();
        info!(
            "P({}={} | {}{}) = {:.4} over {} samples (weighted {:.4}, ess {:.1})",
            query.site,
            label,
            if query.mode == InferenceMode::Intervention { "do " } else { "" },
            evidence,
            probability,
            query.samples,
            weighted_probability,
            effective_sample_size
        );
        Ok(Estimate {
            site: query.site.clone(),
            value: query.value,
            label,
            mode: query.mode,
            evidence,
            samples: query.samples,
            probability,
            weighted_probability,
            effective_sample_size,
            seed,
        })
    }

    /// Answers every query in order, stopping at the first error or when `cancel`
    /// is raised.
    pub fn run_batch(&self, queries: &[Query], cancel: &AtomicBool) -> NetworkResult<Vec<Estimate>> {
        queries.iter().map(|query| self.run_query(query, cancel)).collect()
    }

    /// Collects the value of `site` from `samples` realizations under `plan`,
    /// split across the configured workers. Worker `w` seeds its rng with
    /// `seed + w`; samples are merged in worker order.
    pub fn sample_posterior(
        &self,
        plan: &SamplingPlan,
        site: &str,
        domain_size: usize,
        samples: usize,
        seed: u64,
        cancel: &AtomicBool,
    ) -> NetworkResult<EmpiricalMarginal> {
        if samples == 0 {
            return Err(NetworkError::SampleSize(samples));
        }
        let workers = self.config.workers.clamp(1, samples);
        let chunks: Vec<(u64, usize)> = (0..workers)
            .map(|w| {
                let extra = usize::from(w < samples % workers);
                (seed.wrapping_add(w as u64), samples / workers + extra)
            })
            .collect();

        let parts: Vec<NetworkResult<EmpiricalMarginal>> = if workers == 1 {
            chunks
                .iter()
                .map(|&(seed, count)| self.run_chunk(plan, site, domain_size, count, seed, cancel))
                .collect()
        } else {
            chunks
                .par_iter()
                .map(|&(seed, count)| self.run_chunk(plan, site, domain_size, count, seed, cancel))
                .collect()
        };

        let mut marginal = EmpiricalMarginal::new(site, domain_size);
        for part in parts {
            marginal.merge(part?);
        }
        Ok(marginal)
    }

    fn run_chunk(
        &self,
        plan: &SamplingPlan,
        site: &str,
        domain_size: usize,
        count: usize,
        seed: u64,
        cancel: &AtomicBool,
    ) -> NetworkResult<EmpiricalMarginal> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut memo = ConnectionMemo::new();
        let mut marginal = EmpiricalMarginal::new(site, domain_size);
        for _ in 0..count {
            if cancel.load(Ordering::Relaxed) {
                return Err(NetworkError::Cancelled);
            }
            let realization = build_realization(&self.records, &self.registry, plan, &mut memo, &mut rng)?;
            let value = realization
                .value(site)
                .ok_or_else(|| NetworkError::UnknownSite(site.to_string()))?;
            marginal.push(value, realization.log_weight())?;
        }
        debug!("worker seeded {} drew {} realizations of {}", seed, count, site);
        Ok(marginal)
    }

    /// Checks that the query and every evidence binding name existing sites with
    /// in-domain values, returning the query site's domain size.
    fn validate(&self, evidence: &Evidence, site: &str, value: usize) -> NetworkResult<usize> {
        for (name, bound) in evidence.iter() {
            let evidence_site = self
                .skeleton
                .site(name)
                .ok_or_else(|| NetworkError::UnknownSite(name.to_string()))?;
            if bound >= evidence_site.domain.len() {
                return Err(NetworkError::domain(name, bound));
            }
        }
        let query_site = self
            .skeleton
            .site(site)
            .ok_or_else(|| NetworkError::UnknownSite(site.to_string()))?;
        if value >= query_site.domain.len() {
            return Err(NetworkError::domain(site, value));
        }
        Ok(query_site.domain.len())
    }
}
