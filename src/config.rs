// Configuration file parsing.
// Every field has a default, so an empty or missing file gives a working setup.

use crate::screen::Thresholds;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "screener.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Starting values for the screening sliders
    pub thresholds: Thresholds,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// CSV of NASDAQ listings with `Symbol` and `Company Name` columns
    pub listings_url: String,
    /// Base for `/v8/finance/chart/{ticker}`
    pub chart_base_url: String,
    /// Base for `/v10/finance/quoteSummary/{ticker}` and `/v1/test/getcrumb`
    pub summary_base_url: String,
    /// Host that hands out the consent cookie before a crumb can be requested
    pub consent_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Trailing trading days of closes kept per ticker
    pub history_days: usize,
    /// Only process the first N listings (None = all)
    pub limit: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            listings_url: "https://raw.githubusercontent.com/datasets/nasdaq-listings/master/data/nasdaq-listed-symbols.csv".to_string(),
            chart_base_url: "https://query1.finance.yahoo.com".to_string(),
            summary_base_url: "https://query2.finance.yahoo.com".to_string(),
            consent_url: "https://fc.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 10,
            history_days: 10,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("cache") }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".to_string(), port: 8501 }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.thresholds.validate()?;
        Ok(config)
    }

    /// Loads `explicit` when given, otherwise `screener.toml` if it exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

pub fn default_config_template() -> &'static str {
    r#"# NASDAQ screener configuration
#
# All keys are optional. Command-line flags override these values.

[thresholds]
# Number of continuous red days (2-10)
red_days = 3
# Minimum total % drop over the streak (1-50)
min_drop_pct = 5.0
# Minimum revenue growth in % (0-50)
min_revenue_growth = 5.0
# Minimum earnings growth in % (0-50)
min_earnings_growth = 7.0
# Maximum debt/equity (0-200)
max_debt_equity = 20.0

[fetch]
listings_url = "https://raw.githubusercontent.com/datasets/nasdaq-listings/master/data/nasdaq-listed-symbols.csv"
timeout_secs = 10
history_days = 10
# limit = 100

[cache]
dir = "cache"

[dashboard]
bind = "127.0.0.1"
port = 8501
"#
}
