//! Error types for the harvest pipeline.

use handbook_requisites::RequisiteError;

/// Whether a failed fetch is worth trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Timeouts, connection failures, HTTP 5xx and 429.
    Transient,
    /// Other 4xx, undecodable bodies, malformed URLs.
    Permanent,
}

/// A single document could not be retrieved.
#[derive(thiserror::Error, Debug, Clone)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn transient(url: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status,
            kind: FetchErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(url: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status,
            kind: FetchErrorKind::Permanent,
            message: message.into(),
        }
    }

    /// Classify an HTTP status that is not a success.
    pub fn from_status(url: &str, status: u16) -> Self {
        let message = format!("HTTP {status}");
        if status >= 500 || status == 429 {
            Self::transient(url, Some(status), message)
        } else {
            Self::permanent(url, Some(status), message)
        }
    }

    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if let Some(code) = status {
            return Self::from_status(url, code);
        }
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::transient(url, None, err.to_string())
        } else {
            Self::permanent(url, None, err.to_string())
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FetchErrorKind::Transient
    }
}

/// Errors raised while discovering listings or harvesting a subject.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An expected node was missing from a listing page.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requirements link could not be found on an overview page.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Requisite(#[from] RequisiteError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HarvestResult<T> = Result<T, HarvestError>;
