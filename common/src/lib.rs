pub mod config;
pub mod error;
pub mod types;

pub use config::{InputSpec, PipelineConfig, TargetConfig};
pub use error::{PipelineError, Result};
pub use types::*;
