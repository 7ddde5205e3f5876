use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid order '{0}': expected 'chronological' or 'reverse'")]
    InvalidOrder(String),

    #[error("Invalid output type '{0}': expected 'prices', 'returns' or 'premiums'")]
    InvalidOutputType(String),

    #[error("Invalid fill strategy '{0}': expected 'sequential' or 'previous-date'")]
    InvalidFillStrategy(String),

    #[error("{path:?} line {line}: cannot parse '{value}' as a number")]
    ParseFloat {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Invalid date key '{0}'")]
    InvalidDate(String),

    #[error("{path:?}: header line {index} requested but file has {lines} lines")]
    HeaderOutOfRange {
        path: PathBuf,
        index: usize,
        lines: usize,
    },

    #[error("{path:?} line {line}: missing field {field}")]
    MissingField {
        path: PathBuf,
        line: usize,
        field: usize,
    },

    #[error("Source exhausted at target date {date} (target index {index}, {available} matched source points)")]
    SourceExhausted {
        date: String,
        index: usize,
        available: usize,
    },

    #[error("Length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
