// src/fetch/mod.rs
//! Ordered-fallback fetching over a chain of equivalent upstream endpoints.
//!
//! Endpoints are tried strictly in order, each at most once. The first one
//! that yields a usable payload wins and the rest are never contacted.
//! Worst-case latency of one chain is the sum of per-endpoint timeouts plus
//! `(n - 1) * backoff`.

pub mod transport;

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use reqwest::Method;

use crate::error::FetchError;
pub use transport::{HttpReply, HttpTransport, ReqwestTransport, ScriptedTransport};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_attempts_total", "Upstream endpoint attempts.");
        describe_counter!(
            "fetch_failures_total",
            "Endpoint attempts that failed (transport, status, decode)."
        );
        describe_counter!(
            "fetch_exhausted_total",
            "Endpoint chains where every endpoint failed."
        );
        describe_histogram!("fetch_ms", "Successful endpoint round trip in milliseconds.");
    });
}

/// One candidate endpoint.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl EndpointSpec {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Expand a primary host and its mirrors over one path list:
/// every path on the primary first, then every path on each mirror.
pub fn build_chain(
    primary: &str,
    mirrors: &[String],
    paths: &[String],
    headers: &[(String, String)],
    timeout: Duration,
) -> Vec<EndpointSpec> {
    std::iter::once(primary)
        .chain(mirrors.iter().map(String::as_str))
        .flat_map(|host| {
            let host = host.trim_end_matches('/');
            paths.iter().map(move |p| format!("{host}{p}"))
        })
        .map(|url| EndpointSpec::get(url, timeout).with_headers(headers.iter().cloned()))
        .collect()
}

/// What the caller needs back from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Json,
    Text,
}

/// Parsed upstream body of unknown shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Json(serde_json::Value),
    Text(String),
}

impl RawPayload {
    pub fn into_text(self) -> String {
        match self {
            RawPayload::Text(s) => s,
            RawPayload::Json(v) => v.to_string(),
        }
    }
}

fn decode(endpoint: &EndpointSpec, reply: HttpReply, expect: Expect) -> Result<RawPayload, FetchError> {
    if !reply.is_success() {
        return Err(FetchError::Status {
            url: endpoint.url.clone(),
            status: reply.status,
        });
    }
    match expect {
        Expect::Text => Ok(RawPayload::Text(reply.body)),
        Expect::Json => serde_json::from_str(&reply.body)
            .map(RawPayload::Json)
            .map_err(|e| FetchError::Decode {
                url: endpoint.url.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Try each endpoint in order until one returns a decodable payload.
///
/// An empty-but-valid payload is still a success; emptiness is the caller's
/// concern. `backoff` is slept between attempts, never after the last one.
pub async fn fetch_with_fallback(
    transport: &dyn HttpTransport,
    chain: &[EndpointSpec],
    expect: Expect,
    backoff: Duration,
) -> Result<RawPayload, FetchError> {
    ensure_metrics_described();
    if chain.is_empty() {
        return Err(FetchError::EmptyChain);
    }

    let mut last = None;
    for (i, endpoint) in chain.iter().enumerate() {
        if i > 0 && !backoff.is_zero() {
            tokio::time::sleep(backoff).await;
        }
        counter!("fetch_attempts_total").increment(1);
        tracing::info!(target: "fetch", url = %endpoint.url, attempt = i + 1, "trying endpoint");

        let t0 = Instant::now();
        let outcome = transport
            .send(endpoint)
            .await
            .and_then(|reply| decode(endpoint, reply, expect));

        match outcome {
            Ok(payload) => {
                histogram!("fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                tracing::info!(target: "fetch", url = %endpoint.url, "endpoint succeeded");
                return Ok(payload);
            }
            Err(e) => {
                counter!("fetch_failures_total").increment(1);
                tracing::warn!(target: "fetch", url = %endpoint.url, error = %e, "endpoint failed");
                last = Some(e);
            }
        }
    }

    counter!("fetch_exhausted_total").increment(1);
    let last = last.unwrap_or(FetchError::EmptyChain);
    Err(FetchError::AllEndpointsExhausted {
        attempts: chain.len(),
        last: Box::new(last),
    })
}
