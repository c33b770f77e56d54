use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {ticker} failed with status {status}")]
    Status { ticker: String, status: reqwest::StatusCode },

    #[error("provider error for {ticker}: {description} ({code})")]
    Provider { ticker: String, code: String, description: String },

    #[error("no data returned for {0}")]
    Empty(String),

    #[error("cannot build request URL from base {0}")]
    BadUrl(String),

    #[error("could not obtain a session crumb")]
    Crumb,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to parse provider JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
#[error("{name} must be between {min} and {max}, got {value}")]
pub struct ThresholdError {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub value: f64,
}
