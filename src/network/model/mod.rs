pub mod entities;
pub mod memo;
pub mod registry;
pub mod sampler;
pub mod trace;
