// src/fetch/transport.rs
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::EndpointSpec;
use crate::error::FetchError;

/// Status and body of one upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP exchange. Implementations must honor `endpoint.timeout` and
/// report a timeout as `FetchError::Transport`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, endpoint: &EndpointSpec) -> Result<HttpReply, FetchError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("building reqwest client: {e}"))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, endpoint: &EndpointSpec) -> Result<HttpReply, FetchError> {
        let mut req = self
            .client
            .request(endpoint.method.clone(), &endpoint.url)
            .timeout(endpoint.timeout);
        for (name, value) in &endpoint.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::transport(&endpoint.url, format!("timed out after {:?}", endpoint.timeout))
            } else {
                FetchError::transport(&endpoint.url, e)
            }
        })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Ok(HttpReply::status(status));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::transport(&endpoint.url, e))?;
        Ok(HttpReply { status, body })
    }
}

/// In-memory transport answering from a URL → reply table; unknown URLs fail
/// as transport errors. Records every URL it was asked for, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, Result<HttpReply, String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, url: &str, reply: HttpReply) -> Self {
        self.routes.insert(url.to_string(), Ok(reply));
        self
    }

    pub fn json(self, url: &str, body: serde_json::Value) -> Self {
        self.reply(url, HttpReply::ok(body.to_string()))
    }

    pub fn fail(mut self, url: &str, reason: &str) -> Self {
        self.routes.insert(url.to_string(), Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, endpoint: &EndpointSpec) -> Result<HttpReply, FetchError> {
        match self.calls.lock() {
            Ok(mut g) => g.push(endpoint.url.clone()),
            Err(poison) => poison.into_inner().push(endpoint.url.clone()),
        }
        match self.routes.get(&endpoint.url) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(reason)) => Err(FetchError::transport(&endpoint.url, reason)),
            None => Err(FetchError::transport(&endpoint.url, "connection refused")),
        }
    }
}
