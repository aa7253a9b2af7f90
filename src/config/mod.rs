//! JSON configuration for the batch tools.
pub mod batch;

pub use batch::{load_config, BatchConfig, ConfigError, OutputConfig};
