//! Alignment of a date-keyed source series onto a target date grid.

use std::collections::{BTreeMap, HashSet};

use common::{DateKey, FillStrategy, PipelineError, Result, Series};
use serde::Serialize;

/// Source series re-indexed onto the target dates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// Target dates with no exact source entry, in target order
    pub misses: Vec<DateKey>,
    /// Source date whose value was used, one per target date
    pub dates: Vec<DateKey>,
    /// Matched values, one per target date
    pub values: Vec<f64>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Align `source` onto `targets` using the given fill strategy.
///
/// The result always has exactly `targets.len()` entries.
pub fn match_series(source: &Series, targets: &[DateKey], fill: FillStrategy) -> Result<MatchResult> {
    match fill {
        FillStrategy::Sequential => match_sequential(source.dates(), source.values(), targets),
        FillStrategy::PreviousDate => match_previous_date(source.dates(), source.values(), targets),
    }
}

/// Positional matching.
///
/// Source points whose date appears anywhere in `targets` are consumed in
/// order, one per target date present in the source. A target date absent from
/// the source reads the next unconsumed point without consuming it, so the
/// following value is reused rather than the preceding one.
pub fn match_sequential(
    source_dates: &[DateKey],
    source_values: &[f64],
    targets: &[DateKey],
) -> Result<MatchResult> {
    let target_set: HashSet<&DateKey> = targets.iter().collect();

    let matched: Vec<usize> = source_dates
        .iter()
        .enumerate()
        .filter(|(_, d)| target_set.contains(d))
        .map(|(i, _)| i)
        .collect();

    let matched_dates: HashSet<&DateKey> = matched.iter().map(|&i| &source_dates[i]).collect();
    let misses: Vec<DateKey> = targets
        .iter()
        .filter(|t| !matched_dates.contains(t))
        .cloned()
        .collect();

    let mut dates = Vec::with_capacity(targets.len());
    let mut values = Vec::with_capacity(targets.len());
    let mut next = 0;

    for (index, target) in targets.iter().enumerate() {
        let src = *matched.get(next).ok_or_else(|| PipelineError::SourceExhausted {
            date: target.to_string(),
            index,
            available: matched.len(),
        })?;
        let value = *source_values.get(src).ok_or_else(|| PipelineError::LengthMismatch {
            context: "source dates/values".to_string(),
            expected: source_dates.len(),
            actual: source_values.len(),
        })?;

        dates.push(source_dates[src].clone());
        values.push(value);

        if matched_dates.contains(target) {
            next += 1;
        }
    }

    Ok(MatchResult {
        misses,
        dates,
        values,
    })
}

/// As-of matching: each target takes the value at the latest source date on or
/// before it. Duplicate source dates resolve to the last occurrence.
pub fn match_previous_date(
    source_dates: &[DateKey],
    source_values: &[f64],
    targets: &[DateKey],
) -> Result<MatchResult> {
    if source_dates.len() != source_values.len() {
        return Err(PipelineError::LengthMismatch {
            context: "source dates/values".to_string(),
            expected: source_dates.len(),
            actual: source_values.len(),
        });
    }

    let by_date: BTreeMap<&DateKey, f64> = source_dates
        .iter()
        .zip(source_values.iter().copied())
        .collect();

    let mut result = MatchResult {
        misses: Vec::new(),
        dates: Vec::with_capacity(targets.len()),
        values: Vec::with_capacity(targets.len()),
    };

    for (index, target) in targets.iter().enumerate() {
        let (&date, &value) = by_date
            .range::<&DateKey, _>(..=target)
            .next_back()
            .ok_or_else(|| PipelineError::SourceExhausted {
                date: target.to_string(),
                index,
                available: by_date.len(),
            })?;

        if date != target {
            result.misses.push(target.clone());
        }
        result.dates.push(date.clone());
        result.values.push(value);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<DateKey> {
        raw.iter().map(|d| DateKey::new(*d).unwrap()).collect()
    }

    fn series(raw: &[(&str, f64)]) -> Series {
        let dates = raw.iter().map(|(d, _)| DateKey::new(*d).unwrap()).collect();
        let values = raw.iter().map(|(_, v)| *v).collect();
        Series::new(dates, values).unwrap()
    }

    #[test]
    fn test_gap_reuses_next_value() {
        let targets = keys(&["20200101", "20200102", "20200103"]);
        let source = series(&[("20200101", 10.0), ("20200103", 12.0)]);

        let result = match_series(&source, &targets, FillStrategy::Sequential).unwrap();

        assert_eq!(result.values, vec![10.0, 12.0, 12.0]);
        assert_eq!(result.misses, keys(&["20200102"]));
        assert_eq!(result.dates, keys(&["20200101", "20200103", "20200103"]));
    }

    #[test]
    fn test_exact_match_ignores_extra_source_dates() {
        let targets = keys(&["20200102", "20200103"]);
        let source = series(&[
            ("20191231", 1.0),
            ("20200102", 2.0),
            ("20200103", 3.0),
            ("20200106", 4.0),
        ]);

        let result = match_series(&source, &targets, FillStrategy::Sequential).unwrap();

        assert!(result.misses.is_empty());
        assert_eq!(result.values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_length_equals_targets() {
        let targets = keys(&["20200101", "20200102", "20200103", "20200106", "20200107"]);
        let source = series(&[("20200101", 1.0), ("20200106", 2.0), ("20200107", 3.0)]);

        let result = match_series(&source, &targets, FillStrategy::Sequential).unwrap();
        assert_eq!(result.len(), targets.len());
        assert_eq!(result.misses.len(), 2);
        assert_eq!(result.values, vec![1.0, 2.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_trailing_miss_exhausts_source() {
        let targets = keys(&["20200101", "20200102"]);
        let source = series(&[("20200101", 10.0)]);

        let result = match_series(&source, &targets, FillStrategy::Sequential);
        assert!(matches!(
            result,
            Err(PipelineError::SourceExhausted { index: 1, available: 1, .. })
        ));
    }

    #[test]
    fn test_no_overlap_fails() {
        let targets = keys(&["20200101"]);
        let source = series(&[("20210101", 10.0)]);
        assert!(match_series(&source, &targets, FillStrategy::Sequential).is_err());
    }

    #[test]
    fn test_previous_date_fill() {
        let targets = keys(&["20200101", "20200102", "20200103"]);
        let source = series(&[("20200101", 10.0), ("20200103", 12.0)]);

        let result = match_series(&source, &targets, FillStrategy::PreviousDate).unwrap();

        assert_eq!(result.values, vec![10.0, 10.0, 12.0]);
        assert_eq!(result.misses, keys(&["20200102"]));
        assert_eq!(result.dates, keys(&["20200101", "20200101", "20200103"]));
    }

    #[test]
    fn test_previous_date_before_source_start() {
        let targets = keys(&["20191231", "20200101"]);
        let source = series(&[("20200101", 10.0)]);

        let result = match_series(&source, &targets, FillStrategy::PreviousDate);
        assert!(matches!(
            result,
            Err(PipelineError::SourceExhausted { index: 0, .. })
        ));
    }

    #[test]
    fn test_previous_date_handles_unsorted_source() {
        let targets = keys(&["20200102", "20200105"]);
        let source = series(&[("20200104", 4.0), ("20200101", 1.0), ("20200102", 2.0)]);

        let result = match_series(&source, &targets, FillStrategy::PreviousDate).unwrap();
        assert_eq!(result.values, vec![2.0, 4.0]);
        assert_eq!(result.misses, keys(&["20200105"]));
    }
}
