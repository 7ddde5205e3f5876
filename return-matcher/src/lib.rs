pub mod data;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod returns;

pub use data::{extract_vendor_series, generate_synthetic_days, load_text, TextTable};
pub use matcher::{match_series, MatchResult};
pub use output::{write_mat, write_values_csv};
pub use pipeline::{MatchedInput, Pipeline, PreparedData};
pub use returns::{prices_to_returns, to_premiums};

// Re-export common types
pub use common::{
    DateKey, FillStrategy, InputReport, InputSpec, Order, OutputType, PipelineConfig,
    PipelineError, Result, Row, RunSummary, Series, TargetConfig,
};
