use std::path::Path;

use common::{DateKey, Order, PipelineError, Result, Row, Series, VendorRecord};

use super::loader::parse_value;

/// Field holding the hyphenated date in a vendor record
pub const DATE_FIELD: usize = 0;
/// Field holding the value of interest (close) in a vendor record
pub const VALUE_FIELD: usize = 4;

/// Normalize a vendor date field into a date key.
///
/// Hyphens are removed and characters 1..9 are kept: the vendor export carries a
/// one-character marker before the year (e.g. `"2020-01-02` becomes `20200102`).
pub fn normalize_vendor_date(raw: &str) -> Result<DateKey> {
    let digits: String = raw.split('-').collect();
    let key: String = digits.chars().skip(1).take(8).collect();
    DateKey::new(key).map_err(|_| PipelineError::InvalidDate(raw.to_string()))
}

/// Parse one vendor row into a typed record.
///
/// Vendor lines are tab-separated; when loaded with another separator the tab
/// record sits in field 0 and is split here. Rows already split into several
/// fields are used as they are.
pub fn parse_vendor_row(row: &Row, source: &Path) -> Result<VendorRecord> {
    let first = row.get(0).unwrap_or_default();
    let fields: Vec<&str> = if first.contains('\t') {
        first.split('\t').collect()
    } else {
        row.fields.iter().map(String::as_str).collect()
    };

    let missing = |field| PipelineError::MissingField {
        path: source.to_path_buf(),
        line: row.line,
        field,
    };

    let date = fields
        .get(DATE_FIELD)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| missing(DATE_FIELD))?;
    let value = fields.get(VALUE_FIELD).ok_or_else(|| missing(VALUE_FIELD))?;

    Ok(VendorRecord {
        date: normalize_vendor_date(date)?,
        value: parse_value(value, row.line, source)?,
    })
}

/// Extract the date-keyed value series from vendor rows.
///
/// Vendor files are newest-first: `Order::Chronological` reverses dates and
/// values together, `Order::Reverse` keeps the file order.
pub fn extract_vendor_series(rows: &[Row], order: Order, source: &Path) -> Result<Series> {
    let records = rows
        .iter()
        .map(|row| parse_vendor_row(row, source))
        .collect::<Result<Vec<_>>>()?;

    let series = Series::from_records(records);
    Ok(match order {
        Order::Chronological => series.reversed(),
        Order::Reverse => series,
    })
}

/// String-typed entry point for callers holding an unparsed order value
pub fn extract_vendor_series_with(rows: &[Row], order: &str, source: &Path) -> Result<Series> {
    let order: Order = order.parse()?;
    extract_vendor_series(rows, order, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_row(line: usize, date: &str, close: &str) -> Row {
        Row::new(
            line,
            vec![format!("\"{date}\t1.0\t2.0\t0.5\t{close}\t1000\t{close}")],
        )
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            vendor_row(2, "2020-01-03", "12.0"),
            vendor_row(3, "2020-01-02", "11.0"),
            vendor_row(4, "2020-01-01", "10.0"),
        ]
    }

    #[test]
    fn test_normalize_vendor_date() {
        assert_eq!(normalize_vendor_date("\"2020-01-02").unwrap().as_str(), "20200102");
        assert_eq!(normalize_vendor_date(" 1999-12-31\"").unwrap().as_str(), "19991231");
        // without the leading marker the year is truncated
        assert!(matches!(
            normalize_vendor_date("2020-01-02"),
            Err(PipelineError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_reverse_keeps_file_order() {
        let series = extract_vendor_series(&sample_rows(), Order::Reverse, Path::new("x.csv")).unwrap();
        let dates: Vec<&str> = series.dates().iter().map(DateKey::as_str).collect();
        assert_eq!(dates, vec!["20200103", "20200102", "20200101"]);
        assert_eq!(series.values(), &[12.0, 11.0, 10.0]);
    }

    #[test]
    fn test_chronological_is_exact_reverse() {
        let path = Path::new("x.csv");
        let raw = extract_vendor_series(&sample_rows(), Order::Reverse, path).unwrap();
        let chrono = extract_vendor_series(&sample_rows(), Order::Chronological, path).unwrap();

        let mut expected_dates = raw.dates().to_vec();
        expected_dates.reverse();
        let mut expected_values = raw.values().to_vec();
        expected_values.reverse();

        assert_eq!(chrono.dates(), expected_dates.as_slice());
        assert_eq!(chrono.values(), expected_values.as_slice());
    }

    #[test]
    fn test_invalid_order_string() {
        let result = extract_vendor_series_with(&sample_rows(), "random", Path::new("x.csv"));
        assert!(matches!(result, Err(PipelineError::InvalidOrder(_))));
    }

    #[test]
    fn test_presplit_row() {
        let row = Row::new(
            2,
            ["\"2020-01-02", "1", "2", "0.5", "3.25", "100"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let record = parse_vendor_row(&row, Path::new("x.csv")).unwrap();
        assert_eq!(record.date.as_str(), "20200102");
        assert_eq!(record.value, 3.25);
    }

    #[test]
    fn test_malformed_rows() {
        let path = Path::new("x.csv");

        let short = Row::new(5, vec!["\"2020-01-02\t1\t2".to_string()]);
        assert!(matches!(
            parse_vendor_row(&short, path),
            Err(PipelineError::MissingField { line: 5, field: 4, .. })
        ));

        let bad_value = vendor_row(6, "2020-01-02", "null");
        assert!(matches!(
            parse_vendor_row(&bad_value, path),
            Err(PipelineError::ParseFloat { line: 6, .. })
        ));
    }
}
