use crate::network::common::errors::{NetworkError, NetworkResult};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::Serialize;

/// Values of one query site across many realizations, each with the log
/// importance weight of the realization it came from.
#[derive(Debug, Clone, Serialize)]
pub struct EmpiricalMarginal {
    site: String,
    domain_size: usize,
    values: Vec<usize>,
    log_weights: Vec<f64>,
}

impl EmpiricalMarginal {
    pub fn new(site: impl Into<String>, domain_size: usize) -> Self {
        EmpiricalMarginal {
            site: site.into(),
            domain_size,
            values: Vec::new(),
            log_weights: Vec::new(),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: usize, log_weight: f64) -> NetworkResult<()> {
        if value >= self.domain_size {
            return Err(NetworkError::domain(&self.site, value));
        }
        self.values.push(value);
        self.log_weights.push(log_weight);
        Ok(())
    }

    /// Appends `other`'s samples after this marginal's own.
    pub fn merge(&mut self, other: EmpiricalMarginal) {
        self.values.extend(other.values);
        self.log_weights.extend(other.log_weights);
    }

    /// Weights normalised to sum to one, computed with log-sum-exp.
    pub fn normalized_weights(&self) -> NetworkResult<Vec<f64>> {
        let max = self
            .log_weights
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(NetworkError::ImpossibleEvidence(self.site.clone()));
        }
        let shifted: Vec<f64> = self.log_weights.iter().map(|w| (w - max).exp()).collect();
        let total: f64 = shifted.iter().sum();
        Ok(shifted.into_iter().map(|w| w / total).collect())
    }

    /// True when every sample carries the same weight, as in prior runs and pure
    /// interventions.
    pub fn is_uniform(&self) -> bool {
        match self.log_weights.first() {
            Some(first) => self.log_weights.iter().all(|w| w == first),
            None => true,
        }
    }

    /// Self-normalised importance estimate of P(site = value).
    pub fn weighted_probability(&self, value: usize) -> NetworkResult<f64> {
        self.check_value(value)?;
        let weights = self.normalized_weights()?;
        Ok(self
            .values
            .iter()
            .zip(weights)
            .filter(|(v, _)| **v == value)
            .map(|(_, w)| w)
            .sum())
    }

    /// Kish effective sample size, `1 / sum(w_i^2)` over normalised weights.
    pub fn effective_sample_size(&self) -> NetworkResult<f64> {
        let weights = self.normalized_weights()?;
        let squares: f64 = weights.iter().map(|w| w * w).sum();
        Ok(1.0 / squares)
    }

    /// Draws `count` values with replacement, each with probability proportional
    /// to its weight.
    pub fn resample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> NetworkResult<Vec<usize>> {
        let weights = self.normalized_weights()?;
        let index = WeightedIndex::new(&weights)
            .map_err(|_| NetworkError::ImpossibleEvidence(self.site.clone()))?;
        Ok((0..count).map(|_| self.values[index.sample(rng)]).collect())
    }

    /// The frequency of `value` in the empirical marginal. Equally weighted
    /// samples are counted directly; otherwise `count` draws are taken from the
    /// weighted empirical distribution and counted.
    pub fn frequency<R: Rng + ?Sized>(&self, value: usize, count: usize, rng: &mut R) -> NetworkResult<f64> {
        self.check_value(value)?;
        if count == 0 {
            return Err(NetworkError::SampleSize(count));
        }
        if self.is_empty() {
            return Err(NetworkError::ImpossibleEvidence(self.site.clone()));
        }
        if self.is_uniform() {
            if !self.log_weights[0].is_finite() {
                return Err(NetworkError::ImpossibleEvidence(self.site.clone()));
            }
            let hits = self.values.iter().filter(|v| **v == value).count();
            return Ok(hits as f64 / self.values.len() as f64);
        }
        let draws = self.resample(count, rng)?;
        let hits = draws.iter().filter(|v| **v == value).count();
        Ok(hits as f64 / count as f64)
    }

    /// Weighted probability of every domain value.
    pub fn distribution(&self) -> NetworkResult<Vec<f64>> {
        let weights = self.normalized_weights()?;
        let mut mass = vec![0.0; self.domain_size];
        for (value, weight) in self.values.iter().zip(weights) {
            mass[*value] += weight;
        }
        Ok(mass)
    }

    fn check_value(&self, value: usize) -> NetworkResult<()> {
        if value < self.domain_size {
            Ok(())
        } else {
            Err(NetworkError::domain(&self.site, value))
        }
    }
}
