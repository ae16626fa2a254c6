pub mod graph;
pub mod network;

pub use graph::database::GraphDatabase;
pub use network::{InferenceEngine, NetworkError, Registry};
