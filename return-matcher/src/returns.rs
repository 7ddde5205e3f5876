use common::{PipelineError, Result, Series};
use ndarray::Array2;

/// Divisor turning an annual percentage rate into a monthly fraction
pub const RISK_FREE_DIVISOR: f64 = 12.0 * 100.0;

/// Convert prices to simple returns.
///
/// # Returns
/// `prices.len() - 1` values, `(p[i+1] - p[i]) / p[i]`; empty for fewer than two prices
pub fn prices_to_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Convert a price series to returns, each labelled with its period-start date.
/// The last date has no forward return and is dropped.
pub fn series_to_returns(prices: &Series) -> Result<Series> {
    let returns = prices_to_returns(prices.values());
    let dates = prices.dates().iter().take(returns.len()).cloned().collect();
    Series::new(dates, returns)
}

/// Monthly risk-free fraction for an annual percentage rate
pub fn monthly_risk_free(annual_pct: f64) -> f64 {
    annual_pct / RISK_FREE_DIVISOR
}

/// Subtract the monthly risk-free rate from each return
pub fn to_premiums(returns: &[f64], risk_free: &[f64]) -> Result<Vec<f64>> {
    if returns.len() != risk_free.len() {
        return Err(PipelineError::LengthMismatch {
            context: "premiums vs risk-free series".to_string(),
            expected: returns.len(),
            actual: risk_free.len(),
        });
    }

    Ok(returns
        .iter()
        .zip(risk_free)
        .map(|(r, rf)| r - monthly_risk_free(*rf))
        .collect())
}

/// Build the targets matrix (rows = dates, columns = benchmark portfolios),
/// subtracting the row's monthly risk-free rate when one is given.
pub fn target_matrix(rows: &[Vec<f64>], risk_free: Option<&[f64]>) -> Result<Array2<f64>> {
    let n_cols = rows.first().map_or(0, Vec::len);

    if let Some(rf) = risk_free {
        if rf.len() != rows.len() {
            return Err(PipelineError::LengthMismatch {
                context: "targets vs risk-free series".to_string(),
                expected: rows.len(),
                actual: rf.len(),
            });
        }
    }

    let mut out = Array2::zeros((rows.len(), n_cols));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(PipelineError::LengthMismatch {
                context: format!("target row {i} width"),
                expected: n_cols,
                actual: row.len(),
            });
        }
        let adjust = risk_free.map_or(0.0, |rf| monthly_risk_free(rf[i]));
        for (j, value) in row.iter().enumerate() {
            out[[i, j]] = value - adjust;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use common::DateKey;

    #[test]
    fn test_prices_to_returns() {
        let prices = vec![100.0, 110.0, 99.0, 99.0];
        let returns = prices_to_returns(&prices);

        assert_eq!(returns.len(), prices.len() - 1);
        for (i, r) in returns.iter().enumerate() {
            assert_relative_eq!(*r, (prices[i + 1] - prices[i]) / prices[i]);
        }
        assert_relative_eq!(returns[0], 0.1);
        assert_relative_eq!(returns[1], -0.1);
        assert_eq!(returns[2], 0.0);
    }

    #[test]
    fn test_returns_of_short_series() {
        assert!(prices_to_returns(&[]).is_empty());
        assert!(prices_to_returns(&[42.0]).is_empty());
    }

    #[test]
    fn test_series_to_returns_labels_start_date() {
        let dates = ["20200101", "20200102", "20200103"]
            .iter()
            .map(|d| DateKey::new(*d).unwrap())
            .collect();
        let prices = Series::new(dates, vec![10.0, 11.0, 12.1]).unwrap();

        let returns = series_to_returns(&prices).unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dates()[0].as_str(), "20200101");
        assert_eq!(returns.dates()[1].as_str(), "20200102");
        assert_relative_eq!(returns.values()[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_premiums() {
        let returns = vec![0.01, -0.02, 0.005];
        let rf = vec![1.2, 2.4, 0.0];
        let premiums = to_premiums(&returns, &rf).unwrap();

        for i in 0..returns.len() {
            assert_relative_eq!(premiums[i], returns[i] - rf[i] / 1200.0);
        }
        assert_relative_eq!(premiums[0], 0.009, epsilon = 1e-12);
    }

    #[test]
    fn test_premiums_length_mismatch() {
        assert!(matches!(
            to_premiums(&[0.1, 0.2], &[1.0]),
            Err(PipelineError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_target_matrix() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];

        let raw = target_matrix(&rows, None).unwrap();
        assert_eq!(raw.dim(), (2, 2));
        assert_eq!(raw[[1, 0]], 3.0);

        let rf = [12.0, 0.0];
        let excess = target_matrix(&rows, Some(&rf)).unwrap();
        assert_relative_eq!(excess[[0, 0]], 0.99);
        assert_relative_eq!(excess[[0, 1]], 1.99);
        assert_eq!(excess[[1, 1]], 4.0);
    }

    #[test]
    fn test_target_matrix_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(target_matrix(&rows, None).is_err());
        assert!(target_matrix(&[vec![1.0]], Some(&[1.0, 2.0])).is_err());
    }
}
