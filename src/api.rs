// src/api.rs
//! HTTP surface: query parsing, dispatch, cache headers, CORS.
//!
//! News failures never leave as HTTP errors: a degraded feed is an empty list
//! plus an `error` message in a 200 envelope. Only bad parameters (400),
//! unknown filers (404), misconfiguration and the SEC path (500) do.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::config::ProxyConfig;
use crate::error::ApiError;
use crate::fetch::{HttpTransport, ReqwestTransport};
use crate::ingest::{self, types::CanonicalRecord};
use crate::sec::{Cik, SecClient};
use crate::trades::{StaticTradeBook, TradeLookup};

pub const CACHE_NEWS: &str = "s-maxage=300";
pub const CACHE_SEC: &str = "s-maxage=86400";
pub const CACHE_TRADES: &str = "s-maxage=3600";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub transport: Arc<dyn HttpTransport>,
    pub trades: Arc<dyn TradeLookup>,
}

impl AppState {
    pub fn new(
        config: ProxyConfig,
        transport: Arc<dyn HttpTransport>,
        trades: Arc<dyn TradeLookup>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            trades,
        }
    }

    /// Config from env/file, live reqwest transport, bundled trade book.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ProxyConfig::load_default()?;
        let transport = ReqwestTransport::new()?;
        let trades = StaticTradeBook::builtin()?;
        Ok(Self::new(config, Arc::new(transport), Arc::new(trades)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(news))
        .route("/api/sec", get(sec_holdings))
        .route("/api/trades", get(stock_act_trades))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn required<'q>(
    q: &'q HashMap<String, String>,
    key: &str,
    missing: &'static str,
) -> Result<&'q str, ApiError> {
    q.get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter(missing))
}

#[derive(Debug, Serialize)]
struct NewsEnvelope {
    platform: String,
    timestamp: i64, // unix millis
    latest: Vec<CanonicalRecord>,
    hottest: Vec<CanonicalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn news(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let platform = required(&q, "platform", "platform is required")?;
    let source = state
        .config
        .source(platform)
        .ok_or_else(|| ApiError::InvalidParameter(format!("unsupported platform: {platform}")))?;

    tracing::info!(target: "api", platform = %source.platform, "news request");
    let now = Utc::now();
    let result = ingest::query_source(state.transport.as_ref(), source, &state.config, now).await;

    let envelope = NewsEnvelope {
        platform: source.platform.clone(),
        timestamp: now.timestamp_millis(),
        error: result.degraded_message(&source.name),
        latest: result.latest,
        hottest: result.hottest,
    };
    Ok(([(header::CACHE_CONTROL, CACHE_NEWS)], Json(envelope)).into_response())
}

async fn sec_holdings(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let raw = required(&q, "cik", "CIK is required")?;
    let cik = Cik::parse(raw).ok_or_else(|| ApiError::InvalidParameter(format!("invalid CIK: {raw}")))?;
    if state.config.sec.user_agent.trim().is_empty() {
        return Err(ApiError::Misconfigured(
            "SEC user agent is not configured".to_string(),
        ));
    }

    tracing::info!(target: "api", %cik, "sec holdings request");
    let client = SecClient::new(
        state.transport.as_ref(),
        &state.config.sec,
        state.config.backoff(),
    );
    let holdings = client.holdings_for_cik(cik).await?;
    Ok(([(header::CACHE_CONTROL, CACHE_SEC)], Json(holdings)).into_response())
}

async fn stock_act_trades(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let filer = required(&q, "filer", "Filer name is required")?;
    let trades = state
        .trades
        .trades_for(filer)
        .ok_or_else(|| ApiError::NotFound("No data found for this filer".to_string()))?;
    Ok(([(header::CACHE_CONTROL, CACHE_TRADES)], Json(trades)).into_response())
}
