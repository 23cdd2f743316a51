use std::path::{Path, PathBuf};
use std::time::Duration;

use raiplay_parser::client::DEFAULT_UA;
use raiplay_parser::{ClientConfig, DEFAULT_ORIGIN, ResolverConfig, SeriesFailurePolicy};
use remux_engine::RemuxConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

const APP_DIR: &str = "rai-dl";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog origin relative listing and episode paths are joined onto.
    pub origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Concurrent downloads for a series; unset means one per core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    pub series_failure: SeriesFailurePolicy,
    pub remux: RemuxConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_UA.to_string(),
            timeout_secs: 30,
            parallelism: None,
            series_failure: SeriesFailurePolicy::default(),
            remux: RemuxConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| CliError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// The file `load` reads for `path`, whether or not it exists yet.
    pub fn file_path(path: Option<&Path>) -> Option<PathBuf> {
        path.map(Path::to_path_buf).or_else(Self::default_path)
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn client_config(&self) -> raiplay_parser::Result<ClientConfig> {
        let config = ClientConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..ClientConfig::default()
        };
        config.with_origin(&self.origin)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            series_failure: self.series_failure,
        }
    }
}
