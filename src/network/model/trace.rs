use crate::network::common::errors::{NetworkError, NetworkResult};
use crate::network::inference::evidence::SamplingPlan;
use crate::network::model::memo::ConnectionMemo;
use crate::network::model::registry::{EntityKind, Registry};
use crate::network::model::sampler;
use log::trace;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// How a site obtained its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SiteStatus {
    /// Drawn from its CPT.
    Sampled,
    /// Forced to the evidence value; `likelihood` entered the importance weight.
    Observed { likelihood: f64 },
    /// Fixed by intervention, with its parent edges removed.
    Intervened,
}

/// One named random variable of a realization.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    pub kind: EntityKind,
    pub value: usize,
    pub domain: Arc<[String]>,
    /// Trace names of the parents whose values selected the CPT row. Empty
    /// for intervened sites.
    pub parents: Vec<String>,
    pub parent_values: Vec<usize>,
    pub status: SiteStatus,
}

impl Site {
    pub fn label(&self) -> &str {
        &self.domain[self.value]
    }
}

/// Records the sites of one realization and its accumulated log weight.
pub struct Trace<'a, R: Rng + ?Sized> {
    registry: &'a Registry,
    plan: &'a SamplingPlan,
    rng: &'a mut R,
    sites: Vec<Site>,
    index: HashMap<String, usize>,
    log_weight: f64,
}

impl<'a, R: Rng + ?Sized> Trace<'a, R> {
    pub fn new(registry: &'a Registry, plan: &'a SamplingPlan, rng: &'a mut R) -> Self {
        Trace {
            registry,
            plan,
            rng,
            sites: Vec::new(),
            index: HashMap::new(),
            log_weight: 0.0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Creates the site `name`. `parents` are `(trace name, value)` pairs in the
    /// order of `kind.parent_kinds()`.
    pub fn sample(&mut self, name: String, kind: EntityKind, parents: &[(&str, usize)]) -> NetworkResult<usize> {
        if self.index.contains_key(&name) {
            return Err(NetworkError::DuplicateSite(name));
        }
        let registry = self.registry;
        let domain = registry.shared_domain(kind);

        let (value, parent_names, parent_values, status) = match self.plan.intervention(&name) {
            Some(value) => {
                if value >= domain.len() {
                    return Err(NetworkError::domain(&name, value));
                }
                (value, Vec::new(), Vec::new(), SiteStatus::Intervened)
            }
            None => {
                let parent_values: Vec<usize> = parents.iter().map(|(_, value)| *value).collect();
                let parent_names = parents.iter().map(|(parent, _)| parent.to_string()).collect();
                let probs = registry.cpt(kind, &parent_values)?;
                match self.plan.observation(&name) {
                    Some(value) => {
                        let value = sampler::force(probs, value).map_err(|e| e.at(&name))?;
                        let likelihood = sampler::likelihood(probs, value).map_err(|e| e.at(&name))?;
                        self.log_weight += likelihood.ln();
                        (value, parent_names, parent_values, SiteStatus::Observed { likelihood })
                    }
                    None => {
                        let value = sampler::draw(probs, &mut *self.rng).map_err(|e| e.at(&name))?;
                        (value, parent_names, parent_values, SiteStatus::Sampled)
                    }
                }
            }
        };
        trace!("{} = {} ({:?})", name, domain[value], status);

        self.index.insert(name.clone(), self.sites.len());
        self.sites.push(Site {
            name,
            kind,
            value,
            domain,
            parents: parent_names,
            parent_values,
            status,
        });
        Ok(value)
    }

    pub fn site(&self, name: &str) -> Option<&Site> {
        self.index.get(name).map(|&i| &self.sites[i])
    }

    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }

    /// Hands over the recorded sites, their index and the log weight.
    pub fn finish(self) -> (Vec<Site>, HashMap<String, usize>, f64) {
        (self.sites, self.index, self.log_weight)
    }
}

/// Everything an entity constructor may touch during one realization.
pub struct RealizationContext<'a, R: Rng + ?Sized> {
    pub trace: Trace<'a, R>,
    pub connections: &'a mut ConnectionMemo,
}
