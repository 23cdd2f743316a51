use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("tls configuration error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("request to {url} failed with HTTP {status}")]
    HttpStatus { status: StatusCode, url: String },
    #[error("malformed response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot resolve {url}: {reason}")]
    Resolution { url: String, reason: String },
    #[error("no episodes found for {0}")]
    EmptyCatalog(String),
}

impl CatalogError {
    pub fn resolution(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure happened on the wire rather than in the payload.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. })
    }
}
