use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::{FillStrategy, Order, OutputType};

/// A daily price file and what to produce from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub path: PathBuf,
    pub output_type: OutputType,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>, output_type: OutputType) -> Self {
        Self {
            path: path.into(),
            output_type,
        }
    }
}

/// Benchmark file defining the target date grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub path: PathBuf,
    /// Field separator; `None` splits on whitespace
    pub separator: Option<char>,
    pub header_lines: usize,
    pub header_index: Option<usize>,
    /// Benchmark portfolio columns kept in the targets matrix
    pub columns: Vec<usize>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./raw/FF6Portfolios.txt"),
            separator: None,
            header_lines: 3,
            header_index: Some(1),
            columns: vec![1, 4, 7, 10, 13, 16],
        }
    }
}

/// Pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inputs: Vec<InputSpec>,
    pub target: TargetConfig,
    /// Risk-free series already matched to the target, annual percent
    pub risk_free_path: Option<PathBuf>,
    pub risk_free_separator: Option<char>,
    pub input_separator: Option<char>,
    pub input_header_lines: usize,
    pub order: Order,
    pub fill: FillStrategy,
    pub output_dir: PathBuf,
    pub save_mat: bool,
    pub mat_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let inputs = [
            ("./raw/GoldSilver.csv", OutputType::Returns),
            ("./raw/Nasdaq.csv", OutputType::Returns),
            ("./raw/NYSE_Composite.csv", OutputType::Returns),
            ("./raw/Treasury10yr.csv", OutputType::Prices),
            ("./raw/Treasury_5year.csv", OutputType::Prices),
            ("./raw/VIX.csv", OutputType::Returns),
            ("./raw/SP500_Revised.csv", OutputType::Premiums),
        ]
        .into_iter()
        .map(|(path, output_type)| InputSpec::new(path, output_type))
        .collect();

        Self {
            inputs,
            target: TargetConfig::default(),
            risk_free_path: Some(PathBuf::from("./returns/Libor_returns.csv")),
            risk_free_separator: Some(','),
            input_separator: Some(','),
            input_header_lines: 1,
            order: Order::Chronological,
            fill: FillStrategy::Sequential,
            output_dir: PathBuf::from("."),
            save_mat: true,
            mat_file_name: "All_variables_matched.mat".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing keys take default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Check constraints that cannot be expressed by the types alone
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "no input files configured".to_string(),
            ));
        }

        if self.risk_free_path.is_none() {
            if let Some(input) = self
                .inputs
                .iter()
                .find(|i| i.output_type == OutputType::Premiums)
            {
                return Err(PipelineError::InvalidConfig(format!(
                    "{:?} requests premiums but no risk-free path is set",
                    input.path
                )));
            }
        }

        if self.save_mat && self.mat_file_name.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "mat file name is empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_inputs(mut self, inputs: Vec<InputSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_target_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.target.path = path.into();
        self
    }

    pub fn with_risk_free(mut self, path: Option<PathBuf>) -> Self {
        self.risk_free_path = path;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_fill(mut self, fill: FillStrategy) -> Self {
        self.fill = fill;
        self
    }

    pub fn without_mat(mut self) -> Self {
        self.save_mat = false;
        self
    }
}
