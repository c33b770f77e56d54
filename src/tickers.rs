use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Company Name", default)]
    name: Option<String>,
}

/// Parses a listings CSV. Blank symbols are dropped and duplicates keep their first position.
pub fn parse_listings<R: Read>(reader: R) -> Result<Vec<Listing>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for row in rdr.deserialize::<ListingRow>() {
        let row = row.context("malformed listings row")?;
        let symbol = match row.symbol.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => continue,
        };
        if !seen.insert(symbol.clone()) {
            continue;
        }
        listings.push(Listing {
            symbol,
            name: row.name.map(|n| n.trim().to_string()).unwrap_or_default(),
        });
    }

    Ok(listings)
}

pub fn fetch_listings(url: &str, user_agent: &str, timeout: Duration) -> Result<Vec<Listing>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?;

    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("failed to download listings from {}", url))?;
    if !resp.status().is_success() {
        anyhow::bail!("listings request failed with status: {}", resp.status());
    }
    let body = resp.bytes()?;
    let listings = parse_listings(&body[..])?;
    info!("Loaded {} NASDAQ listings", listings.len());
    Ok(listings)
}

pub fn symbols(listings: &[Listing]) -> Vec<String> {
    listings.iter().map(|l| l.symbol.clone()).collect()
}
