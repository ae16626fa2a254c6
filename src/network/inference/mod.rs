pub mod builder;
pub mod engine;
pub mod evidence;
pub mod marginal;

pub use builder::{Realization, build_realization};
pub use engine::{EngineConfig, Estimate, InferenceEngine, Query};
pub use evidence::{Evidence, InferenceMode, SamplingPlan, assemble_evidence};
