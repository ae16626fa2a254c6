use crate::network::common::errors::{NetworkError, NetworkResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A set of `trace name -> domain index` bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    bindings: BTreeMap<String, usize>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single-entry binding produced by `observe`.
    pub fn single(site: impl Into<String>, value: usize) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(site.into(), value);
        Evidence { bindings }
    }

    /// Adds a binding. Rebinding a site to the same value is a no-op; rebinding
    /// it to a different value is a conflict.
    pub fn bind(&mut self, site: &str, value: usize) -> NetworkResult<()> {
        match self.bindings.get(site) {
            Some(&existing) if existing != value => Err(NetworkError::Conflict {
                site: site.to_string(),
                first: existing,
                second: value,
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(site.to_string(), value);
                Ok(())
            }
        }
    }

    /// Merges observations into one binding map, rejecting contradictions.
    pub fn assemble(observations: &[Evidence]) -> NetworkResult<Evidence> {
        let mut merged = Evidence::new();
        for observation in observations {
            for (site, value) in observation.iter() {
                merged.bind(site, value)?;
            }
        }
        Ok(merged)
    }

    pub fn get(&self, site: &str) -> Option<usize> {
        self.bindings.get(site).copied()
    }

    pub fn contains(&self, site: &str) -> bool {
        self.bindings.contains_key(site)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.bindings.iter().map(|(site, value)| (site.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(site, value)| format!("{}={}", site, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Merges single-entry bindings as produced by `observe`.
pub fn assemble_evidence(observations: &[Evidence]) -> NetworkResult<Evidence> {
    Evidence::assemble(observations)
}

/// How evidence is applied to the network.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
pub enum InferenceMode {
    /// Evidence sites are forced and their likelihood multiplies the weight.
    #[serde(rename = "condition")]
    Condition,
    /// Evidence sites are fixed and cut off from their parents (weight 1).
    #[serde(rename = "intervention")]
    Intervention,
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceMode::Condition => f.write_str("condition"),
            InferenceMode::Intervention => f.write_str("intervention"),
        }
    }
}

/// Which sites a realization forces, and how.
#[derive(Debug, Clone, Default)]
pub struct SamplingPlan {
    observed: Evidence,
    intervened: Evidence,
}

impl SamplingPlan {
    /// No evidence at all: every site is drawn from its CPT.
    pub fn prior() -> Self {
        Self::default()
    }

    pub fn new(evidence: Evidence, mode: InferenceMode) -> Self {
        match mode {
            InferenceMode::Condition => SamplingPlan {
                observed: evidence,
                intervened: Evidence::new(),
            },
            InferenceMode::Intervention => SamplingPlan {
                observed: Evidence::new(),
                intervened: evidence,
            },
        }
    }

    pub fn observed(&self) -> &Evidence {
        &self.observed
    }

    pub fn intervened(&self) -> &Evidence {
        &self.intervened
    }

    pub fn observation(&self, site: &str) -> Option<usize> {
        self.observed.get(site)
    }

    pub fn intervention(&self, site: &str) -> Option<usize> {
        self.intervened.get(site)
    }

    /// Every site the plan touches.
    pub fn sites(&self) -> impl Iterator<Item = &str> + '_ {
        self.observed
            .iter()
            .chain(self.intervened.iter())
            .map(|(site, _)| site)
    }
}
