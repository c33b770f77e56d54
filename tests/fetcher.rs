use httpmock::prelude::*;
use nasdaq_screener::config::FetchConfig;
use nasdaq_screener::error::FetchError;
use nasdaq_screener::fetcher::YahooClient;
use nasdaq_screener::tickers::{fetch_listings, symbols};
use std::time::Duration;

// 2024-03-04..08 at 14:30 UTC.
const CHART: &str = r#"{"chart":{"result":[{
    "timestamp":[1709562600,1709649000,1709735400,1709821800,1709908200],
    "indicators":{"quote":[{"close":[10.0,9.5,9.0,8.5,8.0]}]}
}],"error":null}}"#;

const SUMMARY: &str = r#"{"quoteSummary":{"result":[{"financialData":{
    "revenueGrowth":{"raw":0.08},
    "earningsGrowth":{"raw":0.1},
    "debtToEquity":{"raw":12.5}
}}],"error":null}}"#;

fn config_for(server: &MockServer) -> FetchConfig {
    FetchConfig {
        listings_url: server.url("/listings.csv"),
        chart_base_url: server.base_url(),
        summary_base_url: server.base_url(),
        consent_url: server.url("/consent"),
        timeout_secs: 5,
        ..FetchConfig::default()
    }
}

fn consent_and_crumb(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/consent");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("crumb123");
    })
}

fn summary_ok<'a>(server: &'a MockServer, ticker: &str) -> httpmock::Mock<'a> {
    let path = format!("/v10/finance/quoteSummary/{}", ticker);
    server.mock(|when, then| {
        when.method(GET)
            .path(path)
            .query_param("modules", "financialData")
            .query_param("crumb", "crumb123");
        then.status(200).header("content-type", "application/json").body(SUMMARY);
    })
}

#[test]
fn chart_request_asks_for_daily_bars_with_padding() {
    let server = MockServer::start();
    let chart = server.mock(|when, then| {
        when.method(GET)
            .path("/v8/finance/chart/AAPL")
            .query_param("interval", "1d")
            .query_param("range", "8d");
        then.status(200).header("content-type", "application/json").body(CHART);
    });

    let client = YahooClient::new(&config_for(&server)).unwrap();
    let h = client.fetch_daily_closes("AAPL", 3).unwrap();

    chart.assert_calls(1);
    let closes: Vec<f64> = h.closes.iter().map(|c| c.close).collect();
    assert_eq!(closes, vec![9.0, 8.5, 8.0]);
}

#[test]
fn chart_error_body_on_404_is_a_provider_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/ZZZZ");
        then.status(404).body(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
    });

    let client = YahooClient::new(&config_for(&server)).unwrap();
    match client.fetch_daily_closes("ZZZZ", 10) {
        Err(FetchError::Provider { ticker, code, .. }) => {
            assert_eq!(ticker, "ZZZZ");
            assert_eq!(code, "Not Found");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn bare_server_error_is_a_status_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/DOWN");
        then.status(500).body("upstream exploded");
    });

    let client = YahooClient::new(&config_for(&server)).unwrap();
    match client.fetch_daily_closes("DOWN", 10) {
        Err(FetchError::Status { ticker, status }) => {
            assert_eq!(ticker, "DOWN");
            assert_eq!(status.as_u16(), 500);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn crumb_is_fetched_once_and_reused() {
    let server = MockServer::start();
    let crumb = consent_and_crumb(&server);
    let aapl = summary_ok(&server, "AAPL");
    let msft = summary_ok(&server, "MSFT");

    let mut client = YahooClient::new(&config_for(&server)).unwrap();
    let f = client.fetch_fundamentals("AAPL").unwrap();
    client.fetch_fundamentals("MSFT").unwrap();

    crumb.assert_calls(1);
    aapl.assert_calls(1);
    msft.assert_calls(1);
    assert!((f.revenue_growth - 8.0).abs() < 1e-9);
    assert!((f.earnings_growth - 10.0).abs() < 1e-9);
    assert_eq!(f.debt_equity, 12.5);
}

#[test]
fn unauthorized_response_forces_a_new_crumb() {
    let server = MockServer::start();
    let crumb = consent_and_crumb(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v10/finance/quoteSummary/EXPD");
        then.status(401).body("Unauthorized");
    });
    summary_ok(&server, "AAPL");

    let mut client = YahooClient::new(&config_for(&server)).unwrap();
    match client.fetch_fundamentals("EXPD") {
        Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 401),
        other => panic!("unexpected: {:?}", other),
    }
    client.fetch_fundamentals("AAPL").unwrap();

    crumb.assert_calls(2);
}

#[test]
fn quote_summary_error_body_is_a_provider_error() {
    let server = MockServer::start();
    consent_and_crumb(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v10/finance/quoteSummary/GONE");
        then.status(404).body(
            r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for symbol: GONE"}}}"#,
        );
    });

    let mut client = YahooClient::new(&config_for(&server)).unwrap();
    assert!(matches!(client.fetch_fundamentals("GONE"), Err(FetchError::Provider { .. })));
}

#[test]
fn missing_crumb_fails_the_fundamentals_fetch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("<html>consent page</html>");
    });

    let mut client = YahooClient::new(&config_for(&server)).unwrap();
    assert!(matches!(client.fetch_fundamentals("AAPL"), Err(FetchError::Crumb)));
}

#[test]
fn listings_are_downloaded_and_parsed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/listings.csv");
        then.status(200).body("Symbol,Company Name\nAAPL,Apple Inc.\nMSFT,Microsoft Corporation\n");
    });

    let cfg = config_for(&server);
    let listings = fetch_listings(&cfg.listings_url, &cfg.user_agent, Duration::from_secs(5)).unwrap();
    assert_eq!(symbols(&listings), vec!["AAPL", "MSFT"]);
}

#[test]
fn failed_listings_download_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/listings.csv");
        then.status(503);
    });

    let cfg = config_for(&server);
    let err = fetch_listings(&cfg.listings_url, &cfg.user_agent, Duration::from_secs(5)).unwrap_err();
    assert!(err.to_string().contains("503"));
}
