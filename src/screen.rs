use crate::error::ThresholdError;
use crate::market::{DailyClose, Fundamentals, PriceHistory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

pub const RED_DAYS_RANGE: RangeInclusive<usize> = 2..=10;
pub const MIN_DROP_RANGE: RangeInclusive<f64> = 1.0..=50.0;
pub const MIN_REVENUE_RANGE: RangeInclusive<f64> = 0.0..=50.0;
pub const MIN_EARNINGS_RANGE: RangeInclusive<f64> = 0.0..=50.0;
pub const MAX_DEBT_RANGE: RangeInclusive<f64> = 0.0..=200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Length of the trailing window whose closes must strictly decrease
    pub red_days: usize,
    pub min_drop_pct: f64,
    pub min_revenue_growth: f64,
    pub min_earnings_growth: f64,
    pub max_debt_equity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            red_days: 3,
            min_drop_pct: 5.0,
            min_revenue_growth: 5.0,
            min_earnings_growth: 7.0,
            max_debt_equity: 20.0,
        }
    }
}

fn check(name: &'static str, value: f64, range: &RangeInclusive<f64>) -> Result<(), ThresholdError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ThresholdError { name, min: *range.start(), max: *range.end(), value })
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let days = &RED_DAYS_RANGE;
        if !days.contains(&self.red_days) {
            return Err(ThresholdError {
                name: "red_days",
                min: *days.start() as f64,
                max: *days.end() as f64,
                value: self.red_days as f64,
            });
        }
        check("min_drop_pct", self.min_drop_pct, &MIN_DROP_RANGE)?;
        check("min_revenue_growth", self.min_revenue_growth, &MIN_REVENUE_RANGE)?;
        check("min_earnings_growth", self.min_earnings_growth, &MIN_EARNINGS_RANGE)?;
        check("max_debt_equity", self.max_debt_equity, &MAX_DEBT_RANGE)?;
        Ok(())
    }
}

/// One ticker that passed both the fundamentals and the red-streak filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenHit {
    pub ticker: String,
    pub drop_pct: f64,
    pub revenue_growth: f64,
    pub earnings_growth: f64,
    pub debt_equity: f64,
    /// The trailing closes that formed the streak, oldest first
    pub window: Vec<DailyClose>,
}

pub fn passes_fundamentals(f: &Fundamentals, t: &Thresholds) -> bool {
    f.revenue_growth >= t.min_revenue_growth
        && f.earnings_growth >= t.min_earnings_growth
        && f.debt_equity <= t.max_debt_equity
}

/// Checks that the last `days` closes fall strictly day over day and returns
/// the total drop in percent from the first to the last of them.
pub fn red_streak(history: &PriceHistory, days: usize) -> Option<f64> {
    let window = history.tail(days);
    if window.is_empty() || window.len() < days {
        return None;
    }
    let falling = window.windows(2).all(|pair| pair[1].close < pair[0].close);
    if !falling {
        return None;
    }
    let first = window[0].close;
    let last = window[window.len() - 1].close;
    if first == 0.0 {
        return None;
    }
    Some((first - last) / first * 100.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Runs the screen over every fundamentals row in input order.
///
/// `progress` is called with `(done, total)` after each row that passed the
/// fundamentals filter has been checked against its price history.
pub fn screen<F>(
    fundamentals: &[Fundamentals],
    prices: &HashMap<String, PriceHistory>,
    t: &Thresholds,
    mut progress: F,
) -> Vec<ScreenHit>
where
    F: FnMut(usize, usize),
{
    let candidates: Vec<&Fundamentals> =
        fundamentals.iter().filter(|f| passes_fundamentals(f, t)).collect();
    let total = candidates.len();
    let mut hits = Vec::new();

    for (i, f) in candidates.into_iter().enumerate() {
        if let Some(history) = prices.get(&f.ticker) {
            if let Some(drop) = red_streak(history, t.red_days) {
                if drop >= t.min_drop_pct {
                    hits.push(ScreenHit {
                        ticker: f.ticker.clone(),
                        drop_pct: drop,
                        revenue_growth: f.revenue_growth,
                        earnings_growth: f.earnings_growth,
                        debt_equity: f.debt_equity,
                        window: history.tail(t.red_days).to_vec(),
                    });
                }
            }
        }
        progress(i + 1, total);
    }

    hits
}
