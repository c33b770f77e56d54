use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nasdaq_screener::batch;
use nasdaq_screener::config::{default_config_template, Config};
use nasdaq_screener::dashboard::{DashboardServer, DashboardState};
use nasdaq_screener::fetcher::YahooClient;
use nasdaq_screener::report;
use nasdaq_screener::screen::{round2, screen, Thresholds};
use nasdaq_screener::source::{CacheSource, DataSource, LiveSource};
use nasdaq_screener::tickers;

#[derive(Parser)]
#[command(name = "nasdaq-screener")]
#[command(about = "Screens NASDAQ stocks for consecutive red days with solid fundamentals")]
struct Args {
    /// Path to configuration file (TOML); defaults to ./screener.toml when present
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch fundamentals and prices for every listing and write the cache
    Fetch {
        /// Only process the first N tickers
        #[arg(long)]
        limit: Option<usize>,
        /// Trailing trading days of closes to keep
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Run the screen once and print the matches
    Screen {
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// Fetch live data instead of reading the cache
        #[arg(long)]
        live: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Also write the results table as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(long, value_enum, default_value_t = SourceKind::Cache)]
        source: SourceKind,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print a default configuration file
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Cache,
    Live,
}

#[derive(clap::Args)]
struct ThresholdArgs {
    /// Number of continuous red days (2-10)
    #[arg(long)]
    red_days: Option<usize>,
    /// Minimum total % drop (1-50)
    #[arg(long)]
    min_drop: Option<f64>,
    /// Minimum revenue growth in % (0-50)
    #[arg(long)]
    min_rev: Option<f64>,
    /// Minimum earnings growth in % (0-50)
    #[arg(long)]
    min_earn: Option<f64>,
    /// Maximum debt/equity (0-200)
    #[arg(long)]
    max_debt: Option<f64>,
}

impl ThresholdArgs {
    fn apply(&self, base: Thresholds) -> Result<Thresholds> {
        let t = Thresholds {
            red_days: self.red_days.unwrap_or(base.red_days),
            min_drop_pct: self.min_drop.unwrap_or(base.min_drop_pct),
            min_revenue_growth: self.min_rev.unwrap_or(base.min_revenue_growth),
            min_earnings_growth: self.min_earn.unwrap_or(base.min_earnings_growth),
            max_debt_equity: self.max_debt.unwrap_or(base.max_debt_equity),
        };
        t.validate()?;
        Ok(t)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Config => {
            print!("{}", default_config_template());
            Ok(())
        }
        Command::Fetch { limit, days, cache_dir } => {
            if limit.is_some() {
                config.fetch.limit = limit;
            }
            if let Some(d) = days {
                config.fetch.history_days = d;
            }
            if let Some(dir) = cache_dir {
                config.cache.dir = dir;
            }
            run_fetch(&config)
        }
        Command::Screen { thresholds, live, limit, cache_dir, output } => {
            if limit.is_some() {
                config.fetch.limit = limit;
            }
            if let Some(dir) = cache_dir {
                config.cache.dir = dir;
            }
            let t = thresholds.apply(config.thresholds)?;
            let kind = if live { SourceKind::Live } else { SourceKind::Cache };
            run_screen(&config, kind, &t, output)
        }
        Command::Serve { source, thresholds, bind, port, limit, cache_dir } => {
            if limit.is_some() {
                config.fetch.limit = limit;
            }
            if let Some(dir) = cache_dir {
                config.cache.dir = dir;
            }
            if let Some(b) = bind {
                config.dashboard.bind = b;
            }
            if let Some(p) = port {
                config.dashboard.port = p;
            }
            config.thresholds = thresholds.apply(config.thresholds)?;
            run_serve(&config, source)
        }
    }
}

fn make_source(config: &Config, kind: SourceKind) -> Arc<dyn DataSource> {
    match kind {
        SourceKind::Cache => Arc::new(CacheSource { dir: config.cache.dir.clone() }),
        SourceKind::Live => Arc::new(LiveSource { fetch: config.fetch.clone() }),
    }
}

fn run_fetch(config: &Config) -> Result<()> {
    let listings = tickers::fetch_listings(
        &config.fetch.listings_url,
        &config.fetch.user_agent,
        Duration::from_secs(config.fetch.timeout_secs),
    )?;
    let mut symbols = tickers::symbols(&listings);
    if let Some(limit) = config.fetch.limit {
        symbols.truncate(limit);
    }
    if symbols.is_empty() {
        anyhow::bail!("listings file contained no symbols");
    }

    let mut client = YahooClient::new(&config.fetch).context("failed to build HTTP client")?;
    batch::run(&mut client, &symbols, config.fetch.history_days, &config.cache.dir)?;
    Ok(())
}

fn run_screen(config: &Config, kind: SourceKind, t: &Thresholds, output: Option<PathBuf>) -> Result<()> {
    let source = make_source(config, kind);
    let snapshot = source.load()?;
    let hits = screen(&snapshot.fundamentals, &snapshot.prices, t, |done, total| {
        if done == total {
            debug!("screened {} candidates", total);
        }
    });

    if hits.is_empty() {
        println!("⚠️ No matching stocks found.");
    } else {
        println!("✅ {} stocks found.", hits.len());
        println!();
        print!("{}", report::to_text_table(&hits));
        for hit in &hits {
            println!();
            println!("{} - Last {} Days", hit.ticker, t.red_days);
            for c in &hit.window {
                println!("  {}  {:.2}", c.date, round2(c.close));
            }
        }
    }

    if let Some(path) = output {
        let csv = report::to_csv(&hits)?;
        let mut f = File::create(&path).with_context(|| format!("failed to create output file {}", path.display()))?;
        f.write_all(csv.as_bytes())?;
        info!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn run_serve(config: &Config, kind: SourceKind) -> Result<()> {
    let source = make_source(config, kind);
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        info!("Loading data ({})", source.describe());
        let state = DashboardState::load(source, config.thresholds).await?;
        DashboardServer::new(state, &config.dashboard.bind, config.dashboard.port).run().await
    })
}
