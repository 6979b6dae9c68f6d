//! Market News Proxy: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, the upstream transport and metrics.

use market_news_proxy::{api, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "fetch=info,news=info,sec=info,api=info,warn";

/// Compact logs by default, JSON lines with LOG_FORMAT=json.
/// RUST_LOG overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber may already be installed by the runtime; keep that one.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let state = api::AppState::from_env()?;
    tracing::info!(
        target: "api",
        sources = state.config.sources.len(),
        backoff_ms = state.config.backoff_ms,
        "proxy configured"
    );

    let metrics = Metrics::init()?;
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_every_log_target() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["fetch", "news", "sec", "api"] {
            assert!(DEFAULT_LOG_FILTER.contains(&format!("{target}=info")));
        }
    }
}
