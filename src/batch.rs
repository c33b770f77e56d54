use crate::cache;
use crate::fetcher::MarketData;
use crate::market::{Fundamentals, PriceHistory};
use anyhow::Result;
use log::{info, warn};
use std::path::Path;

#[derive(Debug, Default)]
pub struct Collected {
    pub fundamentals: Vec<Fundamentals>,
    pub prices: Vec<PriceHistory>,
}

/// Fetches fundamentals and trailing closes one ticker at a time.
/// A failure only drops that piece of data for that ticker.
pub fn collect<M: MarketData>(provider: &mut M, tickers: &[String], days: usize) -> Collected {
    let total = tickers.len();
    let mut out = Collected::default();

    for (i, ticker) in tickers.iter().enumerate() {
        info!("[{}/{}] Processing {}", i + 1, total, ticker);

        match provider.fundamentals(ticker) {
            Ok(f) => out.fundamentals.push(f),
            Err(e) => warn!("{}: skipping fundamentals: {}", ticker, e),
        }
        match provider.daily_closes(ticker, days) {
            Ok(h) if !h.is_empty() => out.prices.push(h),
            Ok(_) => warn!("{}: no price history", ticker),
            Err(e) => warn!("{}: skipping prices: {}", ticker, e),
        }
    }

    out
}

/// The offline job: collect everything, then rewrite the cache in one go.
pub fn run<M: MarketData>(provider: &mut M, tickers: &[String], days: usize, cache_dir: &Path) -> Result<Collected> {
    let collected = collect(provider, tickers, days);
    cache::write_cache(cache_dir, &collected.fundamentals, &collected.prices)?;
    info!(
        "Data cached in '{}': {} fundamentals, {} price histories",
        cache_dir.display(),
        collected.fundamentals.len(),
        collected.prices.len()
    );
    Ok(collected)
}
