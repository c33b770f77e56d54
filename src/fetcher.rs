use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::market::{trading_date_from_secs, DailyClose, Fundamentals, PriceHistory};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    financial_data: Option<FinancialData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    revenue_growth: Option<RawValue>,
    earnings_growth: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|v| v.raw)
}

/// Per-ticker data provider used by the batch job and the live dashboard.
pub trait MarketData {
    fn fundamentals(&mut self, ticker: &str) -> Result<Fundamentals, FetchError>;
    fn daily_closes(&mut self, ticker: &str, days: usize) -> Result<PriceHistory, FetchError>;
}

/// Blocking client for the Yahoo chart and quoteSummary endpoints.
pub struct YahooClient {
    client: reqwest::blocking::Client,
    chart_base: String,
    summary_base: String,
    consent_url: String,
    crumb: Option<String>,
}

impl YahooClient {
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            chart_base: cfg.chart_base_url.trim_end_matches('/').to_string(),
            summary_base: cfg.summary_base_url.trim_end_matches('/').to_string(),
            consent_url: cfg.consent_url.clone(),
            crumb: None,
        })
    }

    /// Trailing `days` daily closes. Asks for a few extra calendar days so
    /// weekends and holidays still leave enough trading rows.
    pub fn fetch_daily_closes(&self, ticker: &str, days: usize) -> Result<PriceHistory, FetchError> {
        let url = endpoint(&self.chart_base, &["v8", "finance", "chart", ticker])?;
        let range = format!("{}d", days + 5);

        let resp = self
            .client
            .get(url)
            .query(&[("interval", "1d"), ("range", range.as_str())])
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(provider_error_or_status(ticker, status, &text, parse_chart_error));
        }
        parse_chart(ticker, &text, days)
    }

    pub fn fetch_fundamentals(&mut self, ticker: &str) -> Result<Fundamentals, FetchError> {
        let crumb = self.crumb()?;
        let url = endpoint(&self.summary_base, &["v10", "finance", "quoteSummary", ticker])?;

        let resp = self
            .client
            .get(url)
            .query(&[("modules", "financialData"), ("crumb", crumb.as_str())])
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Crumb expired; the next ticker fetches a new one.
            self.crumb = None;
        }
        if !status.is_success() {
            return Err(provider_error_or_status(ticker, status, &text, parse_summary_error));
        }
        parse_summary(ticker, &text)
    }

    fn crumb(&mut self) -> Result<String, FetchError> {
        if let Some(c) = &self.crumb {
            return Ok(c.clone());
        }
        // Only the cookie matters here; the consent host often answers 404.
        if let Err(e) = self.client.get(&self.consent_url).send() {
            debug!("consent request failed: {}", e);
        }
        let resp = self
            .client
            .get(endpoint(&self.summary_base, &["v1", "test", "getcrumb"])?)
            .send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Crumb);
        }
        let crumb = resp.text()?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(FetchError::Crumb);
        }
        debug!("obtained session crumb");
        self.crumb = Some(crumb.clone());
        Ok(crumb)
    }
}

impl MarketData for YahooClient {
    fn fundamentals(&mut self, ticker: &str) -> Result<Fundamentals, FetchError> {
        self.fetch_fundamentals(ticker)
    }

    fn daily_closes(&mut self, ticker: &str, days: usize) -> Result<PriceHistory, FetchError> {
        self.fetch_daily_closes(ticker, days)
    }
}

/// Appends `segments` to `base`, percent-encoding each one so a symbol
/// like `BRK/B` stays a single path segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, FetchError> {
    let mut url = reqwest::Url::parse(base).map_err(|_| FetchError::BadUrl(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::BadUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn provider_error_or_status(
    ticker: &str,
    status: reqwest::StatusCode,
    body: &str,
    parse: fn(&str) -> Option<YahooError>,
) -> FetchError {
    match parse(body) {
        Some(err) => FetchError::Provider {
            ticker: ticker.to_string(),
            code: err.code,
            description: err.description,
        },
        None => FetchError::Status { ticker: ticker.to_string(), status },
    }
}

fn parse_chart_error(body: &str) -> Option<YahooError> {
    serde_json::from_str::<YahooResponse>(body).ok()?.chart.error
}

fn parse_summary_error(body: &str) -> Option<YahooError> {
    serde_json::from_str::<SummaryResponse>(body).ok()?.quote_summary.error
}

/// Parses a chart response into the trailing `days` closes.
/// Rows with a null close are skipped.
pub fn parse_chart(ticker: &str, body: &str, days: usize) -> Result<PriceHistory, FetchError> {
    let y_resp: YahooResponse = serde_json::from_str(body)?;

    if let Some(err) = y_resp.chart.error {
        return Err(FetchError::Provider {
            ticker: ticker.to_string(),
            code: err.code,
            description: err.description,
        });
    }
    let result = y_resp
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| FetchError::Empty(ticker.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = match result.indicators.quote.first() {
        Some(q) => &q.close,
        None => return Ok(PriceHistory::new(ticker, vec![])),
    };

    let mut rows: Vec<DailyClose> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = closes.get(i).copied().flatten()?;
            let date = trading_date_from_secs(ts)?;
            Some(DailyClose { date, close })
        })
        .collect();

    // The live session can show up as an extra bar sharing the last date.
    rows.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.close = later.close;
            true
        } else {
            false
        }
    });

    let start = rows.len().saturating_sub(days);
    Ok(PriceHistory::new(ticker, rows.split_off(start)))
}

pub fn parse_summary(ticker: &str, body: &str) -> Result<Fundamentals, FetchError> {
    let data: SummaryResponse = serde_json::from_str(body)?;

    if let Some(err) = data.quote_summary.error {
        return Err(FetchError::Provider {
            ticker: ticker.to_string(),
            code: err.code,
            description: err.description,
        });
    }
    let modules = data
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::Empty(ticker.to_string()))?;

    Ok(match modules.financial_data {
        Some(fd) => Fundamentals::from_raw(
            ticker,
            raw(&fd.revenue_growth),
            raw(&fd.earnings_growth),
            raw(&fd.debt_to_equity),
        ),
        None => Fundamentals::from_raw(ticker, None, None, None),
    })
}
