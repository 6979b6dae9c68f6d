// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod metrics;
pub mod sec;
pub mod trades;

pub use crate::api::{router, AppState};
pub use crate::config::ProxyConfig;
pub use crate::error::{ApiError, FetchError, SecError};

/// Build the production router (config from env/file, live HTTP transport).
/// `/metrics` is not included; the binary merges it after installing the recorder.
pub async fn app() -> anyhow::Result<axum::Router> {
    let state = AppState::from_env()?;
    Ok(router(state))
}
