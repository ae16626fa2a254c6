pub mod common;
pub mod graphdb;
pub mod inference;
pub mod model;
pub mod records;
pub mod scenarios;

pub use common::errors::{NetworkError, NetworkResult};
pub use inference::{EngineConfig, Estimate, Evidence, InferenceEngine, InferenceMode, Query};
pub use model::entities::{Entity, EntityId, Observable};
pub use model::registry::{EntityKind, Registry};
pub use records::{RecordSet, RecordSink, RecordSource};
