#![allow(dead_code)]

use chrono::NaiveDate;
use nasdaq_screener::market::{DailyClose, Fundamentals, PriceHistory};

pub fn history(ticker: &str, closes: &[f64]) -> PriceHistory {
    let start = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    PriceHistory::new(
        ticker,
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyClose { date: start + chrono::Duration::days(i as i64), close })
            .collect(),
    )
}

pub fn fundamentals(ticker: &str, rev: f64, earn: f64, de: f64) -> Fundamentals {
    Fundamentals {
        ticker: ticker.to_string(),
        revenue_growth: rev,
        earnings_growth: earn,
        debt_equity: de,
    }
}

/// A small universe: DOWN and SLIDE match the default thresholds, the rest do not.
pub fn universe() -> (Vec<Fundamentals>, Vec<PriceHistory>) {
    (
        vec![
            fundamentals("DOWN", 12.0, 15.0, 10.0),
            fundamentals("LEVER", 12.0, 15.0, 180.0),
            fundamentals("BOUNCE", 12.0, 15.0, 10.0),
            fundamentals("SLIDE", 6.0, 8.0, 0.0),
        ],
        vec![
            history("DOWN", &[110.0, 120.0, 100.0, 95.0, 90.0]),
            history("LEVER", &[100.0, 90.0, 80.0]),
            history("BOUNCE", &[100.0, 90.0, 95.0]),
            history("SLIDE", &[50.0, 49.0, 47.0, 45.0]),
        ],
    )
}
