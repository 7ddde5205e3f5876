use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Normalized `YYYYMMDD` date key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.len() == 8 && key.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(key))
        } else {
            Err(PipelineError::InvalidDate(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date, if the key names a real day
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y%m%d").ok()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DateKey {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

/// One line of a text file split into fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// No fields, or only empty ones
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(String::is_empty)
    }
}

/// Parsed vendor price row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub date: DateKey,
    pub value: f64,
}

/// Date-keyed numeric series. `dates` and `values` always have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    dates: Vec<DateKey>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(dates: Vec<DateKey>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(PipelineError::LengthMismatch {
                context: "series dates/values".to_string(),
                expected: dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self { dates, values })
    }

    pub fn from_records(records: Vec<VendorRecord>) -> Self {
        let (dates, values) = records.into_iter().map(|r| (r.date, r.value)).unzip();
        Self { dates, values }
    }

    pub fn dates(&self) -> &[DateKey] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn reversed(mut self) -> Self {
        self.dates.reverse();
        self.values.reverse();
        self
    }

    pub fn into_parts(self) -> (Vec<DateKey>, Vec<f64>) {
        (self.dates, self.values)
    }
}

/// What gets written for an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Prices,
    Returns,
    Premiums,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Prices => "prices",
            OutputType::Returns => "returns",
            OutputType::Premiums => "premiums",
        }
    }

    /// Whether prices are converted to returns before matching
    pub fn converts_to_returns(&self) -> bool {
        matches!(self, OutputType::Returns | OutputType::Premiums)
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prices" => Ok(OutputType::Prices),
            "returns" => Ok(OutputType::Returns),
            "premiums" => Ok(OutputType::Premiums),
            other => Err(PipelineError::InvalidOutputType(other.to_string())),
        }
    }
}

/// Row order requested from the vendor extractor. Vendor files are newest-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Chronological,
    Reverse,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Chronological => f.write_str("chronological"),
            Order::Reverse => f.write_str("reverse"),
        }
    }
}

impl FromStr for Order {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chronological" => Ok(Order::Chronological),
            "reverse" => Ok(Order::Reverse),
            other => Err(PipelineError::InvalidOrder(other.to_string())),
        }
    }
}

/// How a target date without an exact source match gets its value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStrategy {
    /// Reuse the next unconsumed matched source value without consuming it.
    /// This is positional, not a date-distance lookup.
    #[default]
    Sequential,
    /// Take the value at the latest source date on or before the target date
    PreviousDate,
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillStrategy::Sequential => f.write_str("sequential"),
            FillStrategy::PreviousDate => f.write_str("previous-date"),
        }
    }
}

impl FromStr for FillStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(FillStrategy::Sequential),
            "previous-date" => Ok(FillStrategy::PreviousDate),
            other => Err(PipelineError::InvalidFillStrategy(other.to_string())),
        }
    }
}

/// Per-input outcome of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputReport {
    pub path: PathBuf,
    pub output_type: OutputType,
    pub raw_points: usize,
    pub matched_points: usize,
    pub misses: Vec<DateKey>,
    pub output_file: PathBuf,
}

/// Pipeline run result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub target_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_header: Option<Vec<String>>,
    pub target_dates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<DateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<DateKey>,
    pub inputs: Vec<InputReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mat_file: Option<PathBuf>,
    pub execution_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_validation() {
        assert!(DateKey::new("20200102").is_ok());
        assert!(matches!(
            DateKey::new("0200102"),
            Err(PipelineError::InvalidDate(_))
        ));
        assert!(DateKey::new("2020-1-2").is_err());
    }

    #[test]
    fn test_date_key_to_naive_date() {
        let key = DateKey::new("20240229").unwrap();
        assert_eq!(key.to_naive_date(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let bogus = DateKey::new("20231340").unwrap();
        assert!(bogus.to_naive_date().is_none());
    }

    #[test]
    fn test_series_length_mismatch() {
        let dates = vec![DateKey::new("20200101").unwrap()];
        let result = Series::new(dates, vec![1.0, 2.0]);
        assert!(matches!(result, Err(PipelineError::LengthMismatch { .. })));
    }

    #[test]
    fn test_series_reversed() {
        let dates = vec![
            DateKey::new("20200102").unwrap(),
            DateKey::new("20200101").unwrap(),
        ];
        let series = Series::new(dates, vec![2.0, 1.0]).unwrap().reversed();
        assert_eq!(series.dates()[0].as_str(), "20200101");
        assert_eq!(series.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("chronological".parse::<Order>().unwrap(), Order::Chronological);
        assert_eq!("reverse".parse::<Order>().unwrap(), Order::Reverse);
        assert!(matches!(
            "sideways".parse::<Order>(),
            Err(PipelineError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_output_type_conversion() {
        assert!(!OutputType::Prices.converts_to_returns());
        assert!(OutputType::Returns.converts_to_returns());
        assert!(OutputType::Premiums.converts_to_returns());
        assert!("yields".parse::<OutputType>().is_err());
    }

    #[test]
    fn test_enum_serde_names() {
        let json = serde_json::to_string(&FillStrategy::PreviousDate).unwrap();
        assert_eq!(json, "\"previous-date\"");
        let order: Order = serde_json::from_str("\"reverse\"").unwrap();
        assert_eq!(order, Order::Reverse);
        assert!(serde_json::from_str::<Order>("\"upside-down\"").is_err());
    }
}
