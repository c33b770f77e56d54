use crate::batch;
use crate::cache;
use crate::config::FetchConfig;
use crate::fetcher::YahooClient;
use crate::market::{Fundamentals, PriceHistory};
use crate::tickers;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the screen needs, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub fundamentals: Vec<Fundamentals>,
    pub prices: HashMap<String, PriceHistory>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(fundamentals: Vec<Fundamentals>, prices: Vec<PriceHistory>) -> Self {
        Self {
            fundamentals,
            prices: prices.into_iter().map(|h| (h.ticker.clone(), h)).collect(),
            loaded_at: Some(Utc::now()),
        }
    }
}

pub trait DataSource: Send + Sync {
    /// Short label shown in page titles and logs
    fn describe(&self) -> &'static str;
    /// Blocking; the dashboard calls this off the async runtime.
    fn load(&self) -> Result<Snapshot>;
}

pub struct CacheSource {
    pub dir: PathBuf,
}

impl DataSource for CacheSource {
    fn describe(&self) -> &'static str {
        "From Cached Data"
    }

    fn load(&self) -> Result<Snapshot> {
        let contents = cache::read_cache(&self.dir)?;
        info!(
            "Loaded cache from {}: {} fundamentals, {} price histories",
            self.dir.display(),
            contents.fundamentals.len(),
            contents.prices.len()
        );
        Ok(Snapshot {
            fundamentals: contents.fundamentals,
            prices: contents.prices,
            loaded_at: Some(Utc::now()),
        })
    }
}

/// Fetches straight from the provider on every load, nothing touches disk.
pub struct LiveSource {
    pub fetch: FetchConfig,
}

impl DataSource for LiveSource {
    fn describe(&self) -> &'static str {
        "Live Data"
    }

    fn load(&self) -> Result<Snapshot> {
        let listings = tickers::fetch_listings(
            &self.fetch.listings_url,
            &self.fetch.user_agent,
            Duration::from_secs(self.fetch.timeout_secs),
        )?;
        let mut symbols = tickers::symbols(&listings);
        if let Some(limit) = self.fetch.limit {
            symbols.truncate(limit);
        }

        let mut client = YahooClient::new(&self.fetch).context("failed to build HTTP client")?;
        let collected = batch::collect(&mut client, &symbols, self.fetch.history_days);
        Ok(Snapshot::new(collected.fundamentals, collected.prices))
    }
}
