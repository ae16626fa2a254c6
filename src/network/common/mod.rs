pub mod errors;
pub mod interface;
pub mod report;
pub mod setup;
