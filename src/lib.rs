pub mod batch;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod market;
pub mod report;
pub mod screen;
pub mod source;
pub mod tickers;
