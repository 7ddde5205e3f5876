use std::fs;
use std::path::Path;

use common::{PipelineError, Result, Row};
use tracing::debug;

/// Rows of a text file plus the optionally captured header line
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    pub header: Option<Row>,
    pub rows: Vec<Row>,
}

/// Load a delimited text file into rows of string fields.
///
/// # Arguments
/// * `path` - File to read
/// * `separator` - Field separator, or `None` to split on whitespace
/// * `header_lines` - Number of leading raw lines dropped from `rows`
/// * `header_index` - Raw line (0-based) returned as `header`
///
/// Header counts include blank lines. Lines are trimmed before splitting and
/// quote characters are kept as-is. Blank lines after the header block are
/// dropped. Row width is not validated.
pub fn load_text(
    path: &Path,
    separator: Option<char>,
    header_lines: usize,
    header_index: Option<usize>,
) -> Result<TextTable> {
    let text = fs::read_to_string(path)?;
    let mut rows = match separator {
        Some(sep) => split_delimited(&text, sep)?,
        None => split_whitespace(&text),
    };

    let header = match header_index {
        Some(index) => Some(rows.get(index).cloned().ok_or_else(|| {
            PipelineError::HeaderOutOfRange {
                path: path.to_path_buf(),
                index,
                lines: rows.len(),
            }
        })?),
        None => None,
    };

    let skip = header_lines.min(rows.len());
    rows.drain(..skip);
    rows.retain(|row| !row.is_blank());

    debug!(
        "Loaded {} rows from {:?} (skipped {} header lines)",
        rows.len(),
        path,
        skip
    );

    Ok(TextTable { header, rows })
}

/// One row per raw line; blank lines yield rows without fields
fn split_delimited(text: &str, sep: char) -> Result<Vec<Row>> {
    let delimiter = u8::try_from(sep)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| PipelineError::InvalidConfig(format!("separator {sep:?} is not ASCII")))?;

    let mut rows: Vec<Row> = text
        .lines()
        .enumerate()
        .map(|(idx, _)| Row::new(idx + 1, Vec::new()))
        .collect();

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    // Without quoting every record is one line; the reader skips empty lines.
    let record_lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(idx, _)| idx);

    for (idx, result) in record_lines.zip(csv_reader.records()) {
        let record = result.map_err(|e| PipelineError::CsvError(e.to_string()))?;
        rows[idx].fields = record.iter().map(str::to_string).collect();
    }

    Ok(rows)
}

fn split_whitespace(text: &str) -> Vec<Row> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| Row::new(idx + 1, line.split_whitespace().map(str::to_string).collect()))
        .collect()
}

/// Parse one field of a row as a float, reporting file and line on failure
pub fn parse_field(row: &Row, field: usize, path: &Path) -> Result<f64> {
    let raw = row.get(field).ok_or_else(|| PipelineError::MissingField {
        path: path.to_path_buf(),
        line: row.line,
        field,
    })?;
    parse_value(raw, row.line, path)
}

pub(crate) fn parse_value(raw: &str, line: usize, path: &Path) -> Result<f64> {
    raw.trim().parse().map_err(|_| PipelineError::ParseFloat {
        path: path.to_path_buf(),
        line,
        value: raw.to_string(),
    })
}
