use log::trace;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use thiserror::Error;

use crate::network::common::errors::NetworkError;

/// Sampler failures; the caller attaches the site name via [`SamplerError::at`].
#[derive(Debug, Error, PartialEq)]
pub enum SamplerError {
    #[error("index {index} is outside a distribution of {len} values")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("distribution has no positive mass")]
    NoMass,
}

impl SamplerError {
    pub fn at(self, site: &str) -> NetworkError {
        match self {
            SamplerError::IndexOutOfRange { index, .. } => NetworkError::domain(site, index),
            SamplerError::NoMass => NetworkError::domain(site, "<distribution with no mass>"),
        }
    }
}

fn total_mass(probs: &[f64]) -> Result<f64, SamplerError> {
    let total: f64 = probs.iter().sum();
    if total > 0.0 && total.is_finite() {
        Ok(total)
    } else {
        Err(SamplerError::NoMass)
    }
}

/// Draws an index with probability proportional to `probs[i]`. Zero entries
/// are never drawn.
pub fn draw<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> Result<usize, SamplerError> {
    total_mass(probs)?;
    let index = WeightedIndex::new(probs)
        .map_err(|_| SamplerError::NoMass)?
        .sample(rng);
    trace!("draw: {:?} -> {}", probs, index);
    Ok(index)
}

/// Probability mass at `index`, normalised by the vector's total.
pub fn likelihood(probs: &[f64], index: usize) -> Result<f64, SamplerError> {
    let total = total_mass(probs)?;
    probs
        .get(index)
        .map(|p| p / total)
        .ok_or(SamplerError::IndexOutOfRange { index, len: probs.len() })
}

/// Fixes the outcome to `index` without consuming entropy.
pub fn force(probs: &[f64], index: usize) -> Result<usize, SamplerError> {
    if index < probs.len() {
        Ok(index)
    } else {
        Err(SamplerError::IndexOutOfRange { index, len: probs.len() })
    }
}
