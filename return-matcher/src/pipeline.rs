use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{
    DateKey, InputReport, InputSpec, OutputType, PipelineConfig, Result, Row, RunSummary,
};
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::data::{extract_vendor_series, first_field_dates, load_text, parse_field};
use crate::matcher::{match_series, MatchResult};
use crate::output::{output_path, write_mat, write_values_csv};
use crate::returns::{series_to_returns, target_matrix, to_premiums};

/// One input aligned to the target dates
#[derive(Debug, Clone)]
pub struct MatchedInput {
    pub spec: InputSpec,
    /// Points in the source series before matching (after return conversion)
    pub raw_points: usize,
    pub matched: MatchResult,
    /// Values to persist: matched prices, returns or premiums
    pub values: Vec<f64>,
}

/// Everything computed by a run before it is written out
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub target_header: Option<Row>,
    pub target_dates: Vec<DateKey>,
    /// Rows = target dates, columns = configured benchmark portfolios
    pub targets: Array2<f64>,
    pub inputs: Vec<MatchedInput>,
}

impl PreparedData {
    /// Stack matched inputs as columns (rows = target dates).
    ///
    /// The shape is always `(dates, inputs)`, so a single input is written as
    /// an N x 1 column rather than collapsing to a 1 x N row vector.
    pub fn predictors(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.target_dates.len(), self.inputs.len()), |(i, j)| {
            self.inputs[j].values[i]
        })
    }
}

/// Date-matching pipeline: load, extract, convert, match, write
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and write all outputs
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();

        let prepared = self.prepare()?;
        let mut summary = self.write(&prepared)?;

        summary.execution_time_ms = start_time.elapsed().as_millis() as u64;
        Ok(summary)
    }

    /// Load and align all inputs without touching the output directory
    pub fn prepare(&self) -> Result<PreparedData> {
        self.config.validate()?;

        let target = &self.config.target;
        info!("Loading target data from {:?}", target.path);
        let table = load_text(
            &target.path,
            target.separator,
            target.header_lines,
            target.header_index,
        )?;
        let target_dates = first_field_dates(&table.rows, &target.path)?;

        let risk_free = match &self.config.risk_free_path {
            Some(path) => Some(self.load_risk_free(path)?),
            None => None,
        };

        let target_values = table
            .rows
            .iter()
            .map(|row| {
                target
                    .columns
                    .iter()
                    .map(|&col| parse_field(row, col, &target.path))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let targets = target_matrix(&target_values, risk_free.as_deref())?;
        info!(
            "Target grid: {} dates, {} portfolios",
            target_dates.len(),
            targets.ncols()
        );

        let inputs = self
            .config
            .inputs
            .iter()
            .map(|spec| self.match_input(spec, &target_dates, risk_free.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(PreparedData {
            target_header: table.header,
            target_dates,
            targets,
            inputs,
        })
    }

    /// Write per-input CSV files and, if enabled, the combined MAT-file
    pub fn write(&self, data: &PreparedData) -> Result<RunSummary> {
        let mut reports = Vec::with_capacity(data.inputs.len());

        for input in &data.inputs {
            let outfile = output_path(
                &self.config.output_dir,
                &input.spec.path,
                input.spec.output_type,
            );
            info!("Saving matched data as {:?}", outfile);
            write_values_csv(&outfile, &input.values)?;

            reports.push(InputReport {
                path: input.spec.path.clone(),
                output_type: input.spec.output_type,
                raw_points: input.raw_points,
                matched_points: input.values.len(),
                misses: input.matched.misses.clone(),
                output_file: outfile,
            });
        }

        let mat_file = if self.config.save_mat {
            let path = self.mat_path();
            let predictors = data.predictors();
            info!(
                "Saving {}x{} predictors and {}x{} targets to {:?}",
                predictors.nrows(),
                predictors.ncols(),
                data.targets.nrows(),
                data.targets.ncols(),
                path
            );
            write_mat(
                &path,
                &[("predictors", &predictors), ("targets", &data.targets)],
            )?;
            Some(path)
        } else {
            None
        };

        Ok(RunSummary {
            target_path: self.config.target.path.clone(),
            target_header: data.target_header.as_ref().map(|h| h.fields.clone()),
            target_dates: data.target_dates.len(),
            first_date: data.target_dates.first().cloned(),
            last_date: data.target_dates.last().cloned(),
            inputs: reports,
            mat_file,
            execution_time_ms: 0,
        })
    }

    fn mat_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join("matfiles")
            .join(&self.config.mat_file_name)
    }

    fn load_risk_free(&self, path: &Path) -> Result<Vec<f64>> {
        info!("Loading risk-free series from {:?}", path);
        let table = load_text(path, self.config.risk_free_separator, 0, None)?;
        table
            .rows
            .iter()
            .map(|row| parse_field(row, 0, path))
            .collect()
    }

    fn match_input(
        &self,
        spec: &InputSpec,
        target_dates: &[DateKey],
        risk_free: Option<&[f64]>,
    ) -> Result<MatchedInput> {
        info!("Matching data from {:?}", spec.path);
        let table = load_text(
            &spec.path,
            self.config.input_separator,
            self.config.input_header_lines,
            Some(0),
        )?;
        if let Some(header) = &table.header {
            debug!("Header: {:?}", header.fields);
        }

        let mut series = extract_vendor_series(&table.rows, self.config.order, &spec.path)?;
        if spec.output_type.converts_to_returns() {
            debug!("Converting {:?} to returns", spec.path);
            series = series_to_returns(&series)?;
        }

        let matched = match_series(&series, target_dates, self.config.fill)?;
        if !matched.misses.is_empty() {
            warn!(
                "{} target dates missed by {:?}, filled using {} strategy: {}",
                matched.misses.len(),
                spec.path,
                self.config.fill,
                format_misses(&matched.misses)
            );
        }

        let values = match (spec.output_type, risk_free) {
            (OutputType::Premiums, Some(rf)) => {
                debug!("Converting {:?} to premiums", spec.path);
                to_premiums(&matched.values, rf)?
            }
            _ => matched.values.clone(),
        };

        Ok(MatchedInput {
            spec: spec.clone(),
            raw_points: series.len(),
            matched,
            values,
        })
    }
}

/// Render missed dates as ISO dates where possible
fn format_misses(misses: &[DateKey]) -> String {
    misses
        .iter()
        .map(|d| match d.to_naive_date() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => d.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
