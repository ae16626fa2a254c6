use thiserror::Error;

use crate::network::model::entities::EntityId;
use crate::network::model::registry::EntityKind;

/// Everything that can go wrong while loading tables, building a realization or
/// estimating a marginal. Each variant names the trace or entity at fault so it can
/// be checked against the knowledge base.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid table for {kind}: {reason}")]
    Config { kind: EntityKind, reason: String },

    #[error("value '{value}' is outside the domain of {site}")]
    Domain { site: String, value: String },

    #[error("conflicting evidence for {site}: {first} vs {second}")]
    Conflict {
        site: String,
        first: usize,
        second: usize,
    },

    #[error("sample count must be positive, got {0}")]
    SampleSize(usize),

    #[error("no sample site named {0} in the network")]
    UnknownSite(String),

    #[error("sample site {0} was drawn twice in one realization")]
    DuplicateSite(String),

    #[error("entity name {0} is used by more than one record")]
    DuplicateEntity(String),

    #[error("{entity} references {missing}, which the record source does not provide")]
    DanglingReference { entity: EntityId, missing: EntityId },

    #[error("every realization has zero weight under the evidence on {0}")]
    ImpossibleEvidence(String),

    #[error("estimate cancelled between realizations")]
    Cancelled,

    #[error("record source failure: {0}")]
    Records(#[from] anyhow::Error),
}

impl NetworkError {
    pub fn domain(site: impl Into<String>, value: impl ToString) -> Self {
        NetworkError::Domain {
            site: site.into(),
            value: value.to_string(),
        }
    }

    pub fn config(kind: EntityKind, reason: impl Into<String>) -> Self {
        NetworkError::Config {
            kind,
            reason: reason.into(),
        }
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;
