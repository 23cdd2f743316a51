use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use rustls::crypto::ring;
use rustls_platform_verifier::BuilderVerifierExt;
use scraper::Html;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{CatalogError, Result};

pub const DEFAULT_ORIGIN: &str = "https://www.raiplay.it";
pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Settings for the HTTP side of catalog resolution.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host every relative catalog path is resolved against.
    pub origin: Url,
    pub user_agent: String,
    /// Overall timeout of a single request.
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid url"),
            user_agent: DEFAULT_UA.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

impl ClientConfig {
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        self.origin = Url::parse(origin).map_err(|_| CatalogError::InvalidUrl(origin.into()))?;
        Ok(self)
    }

    /// Builds the `reqwest` client the catalog is fetched with.
    ///
    /// The client is owned by the caller and shared by cloning; there is no
    /// process-wide instance.
    pub fn build_client(&self) -> Result<Client> {
        let provider = Arc::new(ring::default_provider());
        let tls_config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_platform_verifier()?
            .with_no_client_auth();

        Ok(Client::builder()
            .use_preconfigured_tls(tls_config)
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .redirect(Policy::limited(self.max_redirects))
            .build()?)
    }
}

/// Thin fetch-and-parse layer over the two catalog document shapes.
///
/// Every call is a fresh round-trip: nothing is cached and nothing is retried.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    origin: Url,
}

impl MetadataClient {
    pub fn new(client: Client, origin: Url) -> Self {
        Self { client, origin }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(config.build_client()?, config.origin.clone()))
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Places a catalog path such as `/video/2021/ep.html` on the origin.
    ///
    /// Only paths are accepted: absolute and protocol-relative urls are
    /// rejected so every request stays on the catalog host.
    pub fn absolute(&self, path: &str) -> Result<Url> {
        let path = path.trim();
        if path.starts_with("//") || Url::parse(path).is_ok() {
            return Err(CatalogError::InvalidUrl(path.to_string()));
        }

        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.set_path(&format!("/{}", path.trim_start_matches('/')));
        Ok(url)
    }

    /// Fetches the JSON twin of an episode page.
    pub async fn fetch_episode_metadata(&self, episode_url: &str) -> Result<Value> {
        let page = Url::parse(episode_url)
            .map_err(|_| CatalogError::InvalidUrl(episode_url.to_string()))?;
        let json_url = metadata_url(&page);
        debug!(episode_url, %json_url, "fetching episode metadata");
        self.fetch_json(json_url).await
    }

    /// Fetches and parses a programme landing page.
    pub async fn fetch_series_listing_page(&self, series_url: &str) -> Result<Html> {
        let url = Url::parse(series_url)
            .map_err(|_| CatalogError::InvalidUrl(series_url.to_string()))?;
        debug!(%url, "fetching series page");
        let body = self.get_text(url).await?;
        Ok(Html::parse_document(&body))
    }

    pub async fn fetch_json(&self, url: Url) -> Result<Value> {
        let body = self.get_text(url.clone()).await?;
        serde_json::from_str(&body).map_err(|source| CatalogError::MalformedResponse {
            url: url.to_string(),
            source,
        })
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// `https://host/video/x.html?y` → `https://host/video/x.json`
///
/// The extension is whatever follows the last `.` of the final path segment.
/// Query and fragment are dropped.
pub fn metadata_url(page: &Url) -> Url {
    let path = page.path();
    let (dir, file) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    };
    let stem = match file.rfind('.') {
        Some(idx) => &file[..idx],
        None => file,
    };

    let mut json_url = page.clone();
    json_url.set_query(None);
    json_url.set_fragment(None);
    json_url.set_path(&format!("{dir}{stem}.json"));
    json_url
}
