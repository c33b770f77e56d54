//! Web dashboard for the screener.
//!
//! - `GET /` renders sliders, the results table and one chart per match
//! - `GET /export.csv` downloads the current results
//! - `GET /api/results` returns the matches as JSON
//! - `POST /refresh` reloads the snapshot from the data source

mod page;

pub use page::{query_string, render, PageContext};

use crate::report;
use crate::screen::{screen, ScreenHit, Thresholds};
use crate::source::{DataSource, Snapshot};
use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state for the dashboard server.
pub struct DashboardState {
    source: Arc<dyn DataSource>,
    snapshot: RwLock<Snapshot>,
    last_error: RwLock<Option<String>>,
    defaults: Thresholds,
}

impl DashboardState {
    pub fn new(source: Arc<dyn DataSource>, snapshot: Snapshot, defaults: Thresholds) -> Self {
        Self {
            source,
            snapshot: RwLock::new(snapshot),
            last_error: RwLock::new(None),
            defaults,
        }
    }

    /// Performs the first load before the server starts accepting requests.
    pub async fn load(source: Arc<dyn DataSource>, defaults: Thresholds) -> anyhow::Result<Self> {
        let snapshot = load_blocking(source.clone()).await?;
        Ok(Self::new(source, snapshot, defaults))
    }
}

async fn load_blocking(source: Arc<dyn DataSource>) -> anyhow::Result<Snapshot> {
    tokio::task::spawn_blocking(move || source.load())
        .await
        .context("data load task panicked")?
}

/// Slider positions from the query string; missing ones fall back to the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub red_days: Option<usize>,
    pub min_drop_pct: Option<f64>,
    pub min_revenue_growth: Option<f64>,
    pub min_earnings_growth: Option<f64>,
    pub max_debt_equity: Option<f64>,
}

impl ThresholdQuery {
    pub fn resolve(&self, defaults: &Thresholds) -> Thresholds {
        Thresholds {
            red_days: self.red_days.unwrap_or(defaults.red_days),
            min_drop_pct: self.min_drop_pct.unwrap_or(defaults.min_drop_pct),
            min_revenue_growth: self.min_revenue_growth.unwrap_or(defaults.min_revenue_growth),
            min_earnings_growth: self.min_earnings_growth.unwrap_or(defaults.min_earnings_growth),
            max_debt_equity: self.max_debt_equity.unwrap_or(defaults.max_debt_equity),
        }
    }
}

#[derive(Serialize)]
struct ResultsBody<'a> {
    thresholds: Thresholds,
    count: usize,
    hits: &'a [ScreenHit],
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/export.csv", get(export_csv))
        .route("/api/results", get(api_results))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// The dashboard server that serves the page and export endpoints.
pub struct DashboardServer {
    state: Arc<DashboardState>,
    bind: String,
    port: u16,
}

impl DashboardServer {
    pub fn new(state: DashboardState, bind: &str, port: u16) -> Self {
        Self { state: Arc::new(state), bind: bind.to_string(), port }
    }

    /// Runs until the process receives Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.bind, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        info!("Dashboard ({}) listening on http://{}", self.state.source.describe(), addr);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down dashboard");
            })
            .await?;
        Ok(())
    }
}

fn resolve_thresholds(state: &DashboardState, query: &ThresholdQuery) -> Result<Thresholds, Response> {
    let thresholds = query.resolve(&state.defaults);
    thresholds
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;
    Ok(thresholds)
}

fn run_screen(snapshot: &Snapshot, thresholds: &Thresholds) -> Vec<ScreenHit> {
    screen(&snapshot.fundamentals, &snapshot.prices, thresholds, |_, _| {})
}

/// GET / - the dashboard page
async fn index(State(state): State<Arc<DashboardState>>, Query(query): Query<ThresholdQuery>) -> Response {
    let thresholds = match resolve_thresholds(&state, &query) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    // Hits, count and timestamp all come from this one guard.
    let snapshot = state.snapshot.read().await;
    let hits = run_screen(&snapshot, &thresholds);
    let last_error = state.last_error.read().await;
    let html = render(&PageContext {
        source_label: state.source.describe(),
        thresholds: &thresholds,
        hits: &hits,
        loaded_at: snapshot.loaded_at,
        universe: snapshot.fundamentals.len(),
        load_error: last_error.as_deref(),
    });
    Html(html).into_response()
}

/// GET /export.csv - current results as a CSV download
async fn export_csv(State(state): State<Arc<DashboardState>>, Query(query): Query<ThresholdQuery>) -> Response {
    let thresholds = match resolve_thresholds(&state, &query) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let hits = run_screen(&*state.snapshot.read().await, &thresholds);
    match report::to_csv(&hits) {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"screener_results.csv\""),
            ],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// GET /api/results - matches as JSON
async fn api_results(State(state): State<Arc<DashboardState>>, Query(query): Query<ThresholdQuery>) -> Response {
    let thresholds = match resolve_thresholds(&state, &query) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let hits = run_screen(&*state.snapshot.read().await, &thresholds);
    Json(ResultsBody { thresholds, count: hits.len(), hits: &hits }).into_response()
}

/// POST /refresh - reload from the source, then back to the page
async fn refresh(State(state): State<Arc<DashboardState>>) -> Response {
    info!("Reloading data ({})", state.source.describe());
    match load_blocking(state.source.clone()).await {
        Ok(snapshot) => {
            *state.snapshot.write().await = snapshot;
            *state.last_error.write().await = None;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            warn!("Reload failed: {:#}", e);
            *state.last_error.write().await = Some(format!("{:#}", e));
            Redirect::to("/").into_response()
        }
    }
}
