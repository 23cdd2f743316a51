use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("not a RaiPlay episode or programme url: {0}")]
    UnsupportedUrl(String),

    #[error("{unresolved} of {total} episodes could not be resolved")]
    UnresolvedEpisodes { unresolved: usize, total: usize },

    #[error("{failed} of {total} downloads did not succeed")]
    DownloadsFailed { failed: usize, total: usize },

    #[cfg(feature = "interactive")]
    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
}

pub type Result<T> = std::result::Result<T, CliError>;
