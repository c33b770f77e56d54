use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

/// Revenue/earnings growth used when the provider has no value.
pub const MISSING_GROWTH: f64 = 0.0;
/// Debt/equity used when the provider has no value. Large enough to fail any max-debt filter.
pub const MISSING_DEBT_EQUITY: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub ticker: String,
    pub closes: Vec<DailyClose>, // chronological
}

impl PriceHistory {
    pub fn new(ticker: &str, closes: Vec<DailyClose>) -> Self {
        Self { ticker: ticker.to_uppercase(), closes }
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Last `n` rows, or all of them when the history is shorter.
    pub fn tail(&self, n: usize) -> &[DailyClose] {
        let start = self.closes.len().saturating_sub(n);
        &self.closes[start..]
    }
}

/// Fundamental ratios for one ticker. Growth figures are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub ticker: String,
    pub revenue_growth: f64,
    pub earnings_growth: f64,
    pub debt_equity: f64,
}

impl Fundamentals {
    /// Builds a row from the provider's raw values: growths arrive as fractions
    /// (0.12 = 12%), debt/equity already as a percentage ratio.
    pub fn from_raw(
        ticker: &str,
        revenue_growth: Option<f64>,
        earnings_growth: Option<f64>,
        debt_equity: Option<f64>,
    ) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            revenue_growth: revenue_growth.map(|g| g * 100.0).unwrap_or(MISSING_GROWTH),
            earnings_growth: earnings_growth.map(|g| g * 100.0).unwrap_or(MISSING_GROWTH),
            debt_equity: debt_equity.unwrap_or(MISSING_DEBT_EQUITY),
        }
    }
}

/// Calendar date of a bar timestamp on the exchange clock (America/New_York).
pub fn trading_date(ts_utc: DateTime<Utc>) -> NaiveDate {
    ts_utc.with_timezone(&New_York).date_naive()
}

pub fn trading_date_from_secs(ts_secs: i64) -> Option<NaiveDate> {
    Utc.timestamp_opt(ts_secs, 0).single().map(trading_date)
}
