pub mod adapter;
pub mod schema;

pub use adapter::GraphRecordStore;
pub use schema::{EdgeLabel, NodeLabel};
