//! Flat columnar dump of fetched data, one CSV file per table.

use crate::market::{DailyClose, Fundamentals, PriceHistory};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";
pub const PRICES_FILE: &str = "price_data.csv";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FundamentalRow {
    ticker: String,
    revenue_growth: f64,
    earnings_growth: f64,
    debt_equity: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PriceRow {
    ticker: String,
    date: NaiveDate,
    close: f64,
}

#[derive(Debug, Default)]
pub struct CacheContents {
    pub fundamentals: Vec<Fundamentals>,
    pub prices: HashMap<String, PriceHistory>,
}

pub fn fundamentals_path(dir: &Path) -> PathBuf {
    dir.join(FUNDAMENTALS_FILE)
}

pub fn prices_path(dir: &Path) -> PathBuf {
    dir.join(PRICES_FILE)
}

/// Overwrites both cache files under `dir`, creating the directory if needed.
pub fn write_cache(dir: &Path, fundamentals: &[Fundamentals], prices: &[PriceHistory]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create cache dir {}", dir.display()))?;

    let path = fundamentals_path(dir);
    let mut w = csv::Writer::from_path(&path).with_context(|| format!("failed to create {}", path.display()))?;
    for f in fundamentals {
        w.serialize(FundamentalRow {
            ticker: f.ticker.clone(),
            revenue_growth: f.revenue_growth,
            earnings_growth: f.earnings_growth,
            debt_equity: f.debt_equity,
        })?;
    }
    if fundamentals.is_empty() {
        w.write_record(["Ticker", "RevenueGrowth", "EarningsGrowth", "DebtEquity"])?;
    }
    w.flush()?;

    let path = prices_path(dir);
    let mut w = csv::Writer::from_path(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut wrote_any = false;
    for h in prices {
        for c in &h.closes {
            w.serialize(PriceRow { ticker: h.ticker.clone(), date: c.date, close: c.close })?;
            wrote_any = true;
        }
    }
    if !wrote_any {
        w.write_record(["Ticker", "Date", "Close"])?;
    }
    w.flush()?;

    Ok(())
}

pub fn read_cache(dir: &Path) -> Result<CacheContents> {
    let path = fundamentals_path(dir);
    let mut rdr = csv::Reader::from_path(&path).with_context(|| {
        format!("cannot open {} (run `nasdaq-screener fetch` to build the cache)", path.display())
    })?;
    let mut fundamentals = Vec::new();
    for row in rdr.deserialize::<FundamentalRow>() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        fundamentals.push(Fundamentals {
            ticker: row.ticker,
            revenue_growth: row.revenue_growth,
            earnings_growth: row.earnings_growth,
            debt_equity: row.debt_equity,
        });
    }

    let path = prices_path(dir);
    let mut rdr = csv::Reader::from_path(&path).with_context(|| {
        format!("cannot open {} (run `nasdaq-screener fetch` to build the cache)", path.display())
    })?;
    let mut prices: HashMap<String, PriceHistory> = HashMap::new();
    for row in rdr.deserialize::<PriceRow>() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        prices
            .entry(row.ticker.clone())
            .or_insert_with(|| PriceHistory::new(&row.ticker, Vec::new()))
            .closes
            .push(DailyClose { date: row.date, close: row.close });
    }
    for h in prices.values_mut() {
        h.closes.sort_by_key(|c| c.date);
    }

    Ok(CacheContents { fundamentals, prices })
}
