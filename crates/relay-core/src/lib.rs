pub mod config;
pub mod relay;
pub mod store;
pub mod types;

pub use types::*;
