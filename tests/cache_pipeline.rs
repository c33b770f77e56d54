mod common;

use nasdaq_screener::batch;
use nasdaq_screener::cache::{self, read_cache, write_cache};
use nasdaq_screener::error::FetchError;
use nasdaq_screener::fetcher::MarketData;
use nasdaq_screener::market::{Fundamentals, PriceHistory};
use nasdaq_screener::screen::{screen, Thresholds};
use nasdaq_screener::source::{CacheSource, DataSource};
use std::collections::HashMap;
use tempfile::tempdir;

#[test]
fn cached_universe_screens_like_in_memory() {
    let dir = tempdir().unwrap();
    let (funds, prices) = common::universe();
    write_cache(dir.path(), &funds, &prices).unwrap();

    let contents = read_cache(dir.path()).unwrap();
    assert_eq!(contents.fundamentals, funds);
    assert_eq!(contents.prices.len(), 4);
    assert_eq!(contents.prices["DOWN"].closes, prices[0].closes);

    let hits = screen(&contents.fundamentals, &contents.prices, &Thresholds::default(), |_, _| {});
    let tickers: Vec<&str> = hits.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["DOWN", "SLIDE"]);
    assert!((hits[0].drop_pct - 10.0).abs() < 1e-9);
}

#[test]
fn price_file_holds_one_row_per_ticker_day() {
    let dir = tempdir().unwrap();
    let (funds, prices) = common::universe();
    write_cache(dir.path(), &funds, &prices).unwrap();

    let text = std::fs::read_to_string(cache::prices_path(dir.path())).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Ticker,Date,Close"));
    assert_eq!(lines.next(), Some("DOWN,2024-09-02,110.0"));
    assert_eq!(text.lines().count(), 1 + 5 + 3 + 3 + 4);

    let text = std::fs::read_to_string(cache::fundamentals_path(dir.path())).unwrap();
    assert_eq!(text.lines().next(), Some("Ticker,RevenueGrowth,EarningsGrowth,DebtEquity"));
}

#[test]
fn rewrite_replaces_previous_cache() {
    let dir = tempdir().unwrap();
    let (funds, prices) = common::universe();
    write_cache(dir.path(), &funds, &prices).unwrap();
    write_cache(dir.path(), &funds[..1], &prices[..1]).unwrap();

    let contents = read_cache(dir.path()).unwrap();
    assert_eq!(contents.fundamentals.len(), 1);
    assert_eq!(contents.prices.len(), 1);
}

#[test]
fn empty_cache_reads_back_empty() {
    let dir = tempdir().unwrap();
    write_cache(dir.path(), &[], &[]).unwrap();
    let contents = read_cache(dir.path()).unwrap();
    assert!(contents.fundamentals.is_empty());
    assert!(contents.prices.is_empty());
}

#[test]
fn missing_cache_error_points_at_fetch() {
    let dir = tempdir().unwrap();
    let source = CacheSource { dir: dir.path().join("nope") };
    let err = source.load().unwrap_err();
    assert!(format!("{:#}", err).contains("nasdaq-screener fetch"));
}

/// Serves canned data; tickers listed in `broken` fail both requests.
struct Canned {
    funds: HashMap<String, Fundamentals>,
    prices: HashMap<String, PriceHistory>,
    broken: Vec<&'static str>,
    calls: Vec<String>,
}

impl MarketData for Canned {
    fn fundamentals(&mut self, ticker: &str) -> Result<Fundamentals, FetchError> {
        self.calls.push(format!("f:{}", ticker));
        if self.broken.contains(&ticker) {
            return Err(FetchError::Empty(ticker.to_string()));
        }
        self.funds.get(ticker).cloned().ok_or_else(|| FetchError::Empty(ticker.to_string()))
    }

    fn daily_closes(&mut self, ticker: &str, days: usize) -> Result<PriceHistory, FetchError> {
        self.calls.push(format!("p:{}", ticker));
        if self.broken.contains(&ticker) {
            return Err(FetchError::Empty(ticker.to_string()));
        }
        let h = self.prices.get(ticker).cloned().unwrap_or_else(|| PriceHistory::new(ticker, vec![]));
        let tail = h.tail(days).to_vec();
        Ok(PriceHistory::new(ticker, tail))
    }
}

#[test]
fn batch_skips_failures_and_writes_what_it_got() {
    let dir = tempdir().unwrap();
    let (funds, prices) = common::universe();
    let mut provider = Canned {
        funds: funds.iter().map(|f| (f.ticker.clone(), f.clone())).collect(),
        prices: prices.iter().map(|h| (h.ticker.clone(), h.clone())).collect(),
        broken: vec!["LEVER"],
        calls: Vec::new(),
    };
    let tickers: Vec<String> = ["DOWN", "LEVER", "NOHIST", "SLIDE"].iter().map(|s| s.to_string()).collect();

    let collected = batch::run(&mut provider, &tickers, 3, dir.path()).unwrap();

    // One ticker at a time, fundamentals before prices.
    assert_eq!(&provider.calls[..4], &["f:DOWN", "p:DOWN", "f:LEVER", "p:LEVER"]);
    let fund_tickers: Vec<&str> = collected.fundamentals.iter().map(|f| f.ticker.as_str()).collect();
    assert_eq!(fund_tickers, vec!["DOWN", "SLIDE"]);
    // NOHIST has no history at all, so nothing is stored for it.
    assert_eq!(collected.prices.len(), 2);
    assert!(collected.prices.iter().all(|h| h.len() <= 3));

    let contents = read_cache(dir.path()).unwrap();
    assert_eq!(contents.fundamentals.len(), 2);
    assert_eq!(contents.prices["SLIDE"].len(), 3);
}
