pub mod loader;
pub mod synthetic;
pub mod vendor;

pub use loader::{load_text, parse_field, TextTable};
pub use synthetic::{generate_synthetic_days, write_vendor_file, SyntheticDay};
pub use vendor::{extract_vendor_series, extract_vendor_series_with, normalize_vendor_date};

use std::path::Path;

use common::{DateKey, PipelineError, Result, Row};

/// Read the date key in the first field of every row
pub fn first_field_dates(rows: &[Row], path: &Path) -> Result<Vec<DateKey>> {
    rows.iter()
        .map(|row| {
            let raw = row.get(0).ok_or_else(|| PipelineError::MissingField {
                path: path.to_path_buf(),
                line: row.line,
                field: 0,
            })?;
            DateKey::new(raw)
        })
        .collect()
}
