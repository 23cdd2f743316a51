use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::MetadataClient;
use crate::descriptor::Descriptor;
use crate::error::{CatalogError, Result};
use crate::models::{EpisodeDocument, EpisodesWidget, SeriesDocument};

/// What `resolve_series` does when one episode of a series cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFailurePolicy {
    /// The whole series fails on the first broken episode.
    #[default]
    Abort,
    /// Broken episodes are reported next to the resolved ones.
    Isolate,
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub series_failure: SeriesFailurePolicy,
}

/// An episode of a series that could not be resolved.
#[derive(Debug)]
pub struct EpisodeFailure {
    pub url: String,
    pub error: CatalogError,
}

/// Everything `resolve_series` learned about a programme, in card order.
#[derive(Debug, Default)]
pub struct SeriesResolution {
    pub descriptors: Vec<Descriptor>,
    /// Always empty under [`SeriesFailurePolicy::Abort`].
    pub failures: Vec<EpisodeFailure>,
}

impl SeriesResolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_descriptors(self) -> Vec<Descriptor> {
        self.descriptors
    }
}

/// Turns catalog page urls into download descriptors.
#[derive(Debug, Clone)]
pub struct RequestResolver {
    client: MetadataClient,
    config: ResolverConfig,
}

impl RequestResolver {
    pub fn new(client: MetadataClient) -> Self {
        Self::with_config(client, ResolverConfig::default())
    }

    pub fn with_config(client: MetadataClient, config: ResolverConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &MetadataClient {
        &self.client
    }

    /// Resolves a single episode page.
    pub async fn resolve_one(&self, episode_url: &str) -> Result<Descriptor> {
        let document = self.client.fetch_episode_metadata(episode_url).await?;
        let descriptor = descriptor_from_document(episode_url, document)?;
        debug!(
            url = episode_url,
            title = descriptor.title(),
            season = descriptor.season(),
            episode = descriptor.episode(),
            "resolved episode"
        );
        Ok(descriptor)
    }

    /// Resolves every episode listed on a programme page.
    ///
    /// Only the first season entry of the listing is scanned, and within it
    /// only the first episode block that has cards. Episodes are resolved one
    /// after another in card order.
    pub async fn resolve_series(&self, series_url: &str) -> Result<SeriesResolution> {
        let widget = {
            let page = self.client.fetch_series_listing_page(series_url).await?;
            EpisodesWidget::from_document(&page, series_url)?
        };

        let listing_url = self.client.absolute(&widget.listing_path())?;
        debug!(series_url, %listing_url, "fetching series listing");
        let listing = self.client.fetch_json(listing_url.clone()).await?;
        let listing: SeriesDocument = serde_json::from_value(listing)
            .map_err(|e| CatalogError::resolution(listing_url.as_str(), e.to_string()))?;

        let cards = listing
            .authoritative_cards()
            .ok_or_else(|| CatalogError::EmptyCatalog(series_url.to_string()))?;
        info!(series_url, episodes = cards.len(), "found episode cards");

        let mut resolution = SeriesResolution {
            descriptors: Vec::with_capacity(cards.len()),
            failures: Vec::new(),
        };

        for card in cards {
            let resolved = match self.client.absolute(&card.path_id) {
                Ok(url) => {
                    let episode_url = url.to_string();
                    self.resolve_one(&episode_url)
                        .await
                        .map_err(|error| (episode_url, error))
                }
                Err(error) => Err((card.path_id.clone(), error)),
            };

            match resolved {
                Ok(descriptor) => resolution.descriptors.push(descriptor),
                Err((url, error)) => match self.config.series_failure {
                    SeriesFailurePolicy::Abort => return Err(error),
                    SeriesFailurePolicy::Isolate => {
                        warn!(url = %url, error = %error, "skipping unresolvable episode");
                        resolution.failures.push(EpisodeFailure { url, error });
                    }
                },
            }
        }

        Ok(resolution)
    }
}

fn descriptor_from_document(episode_url: &str, document: Value) -> Result<Descriptor> {
    let doc: EpisodeDocument = serde_json::from_value(document)
        .map_err(|e| CatalogError::resolution(episode_url, e.to_string()))?;
    Descriptor::new(
        episode_url,
        doc.name,
        doc.season,
        doc.episode,
        doc.video.content_url,
    )
}
