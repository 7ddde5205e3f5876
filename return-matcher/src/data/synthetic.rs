use std::fs;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use common::Result;
use rand::Rng;

/// Header line of a vendor daily price export
pub const VENDOR_HEADER: &str = "Date\tOpen\tHigh\tLow\tClose\tVolume\tAdj Close";

/// One synthetic trading day
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDay {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl SyntheticDay {
    /// Flat day that opens, trades and closes at `close`
    pub fn at_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    /// Render as a vendor line, date prefixed with the export's quote marker
    pub fn to_vendor_line(&self) -> String {
        format!(
            "\"{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}\t{:.4}",
            self.date.format("%Y-%m-%d"),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.close
        )
    }
}

/// Generate a random-walk price history over weekdays starting at `start`.
/// Days are returned oldest-first.
pub fn generate_synthetic_days(days: usize, initial_price: f64, start: NaiveDate) -> Vec<SyntheticDay> {
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(days);

    let daily_volatility = 0.01;
    let drift = 0.0002;

    let mut price = initial_price;
    let mut date = start;

    while out.len() < days {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
            continue;
        }

        let random_return: f64 = rng.gen_range(-1.0..1.0);
        let close = price * (1.0 + drift + daily_volatility * random_return);
        let range = price * rng.gen_range(0.002..0.02);
        let open = price;

        out.push(SyntheticDay {
            date,
            open,
            high: open.max(close) + range / 2.0,
            low: open.min(close) - range / 2.0,
            close,
            volume: rng.gen_range(1_000_000..5_000_000),
        });

        price = close;
        date += Duration::days(1);
    }

    out
}

/// Write days as a newest-first vendor file with its header line
pub fn write_vendor_file(path: &Path, days: &[SyntheticDay]) -> Result<()> {
    let mut contents = String::from(VENDOR_HEADER);
    contents.push('\n');
    for day in days.iter().rev() {
        contents.push_str(&day.to_vendor_line());
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}
