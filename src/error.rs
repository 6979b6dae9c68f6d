// src/error.rs
//! Error taxonomy shared by the fetch chain, the SEC client and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Failure of one endpoint attempt or of a whole endpoint chain.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Network error, timeout, or a body that could not be read.
    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Upstream answered outside the 2xx range.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body arrived but is not valid JSON for a JSON-expecting caller.
    #[error("invalid JSON from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The chain was empty, nothing to try.
    #[error("endpoint chain is empty")]
    EmptyChain,

    /// Every endpoint in the chain failed; carries the last attempt's error.
    #[error("all {attempts} endpoints exhausted, last error: {last}")]
    AllEndpointsExhausted {
        attempts: usize,
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn transport(url: &str, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::AllEndpointsExhausted { .. })
    }
}

/// Failures of the SEC 13F holdings path. These surface as HTTP 500.
#[derive(Debug, thiserror::Error)]
pub enum SecError {
    #[error("SEC submissions lookup failed: {0}")]
    Submissions(#[source] FetchError),

    #[error("SEC submissions payload has no filings.recent table")]
    MalformedSubmissions,

    #[error("No recent 13F-HR filing found for CIK {cik}")]
    NoFiling { cik: String },

    #[error("Could not retrieve holdings data: {0}")]
    Holdings(#[source] FetchError),
}

/// Errors that leave a handler as a non-200 response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingParameter(&'static str),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Misconfigured(String),

    #[error(transparent)]
    Sec(#[from] SecError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Misconfigured(_) | ApiError::Sec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "api", error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
