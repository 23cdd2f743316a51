//! Wire shapes of the RaiPlay catalog documents.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer, de};

use crate::error::{CatalogError, Result};

/// Episode metadata served next to every `/video/...html` page as `.json`.
#[derive(Debug, Deserialize)]
pub struct EpisodeDocument {
    pub name: String,
    #[serde(deserialize_with = "catalog_number")]
    pub season: u32,
    #[serde(deserialize_with = "catalog_number")]
    pub episode: u32,
    pub video: VideoInfo,
}

#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub content_url: String,
}

/// Listing of every season and episode block of a programme.
#[derive(Debug, Deserialize)]
pub struct SeriesDocument {
    pub seasons: Vec<SeasonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonEntry {
    #[serde(default)]
    pub episodes: Vec<EpisodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeEntry {
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub path_id: String,
}

impl SeriesDocument {
    /// The cards of the first non-empty episode block of the first season.
    ///
    /// Later seasons and later episode blocks are never consulted.
    pub fn authoritative_cards(&self) -> Option<&[Card]> {
        self.seasons
            .first()?
            .episodes
            .iter()
            .map(|entry| entry.cards.as_slice())
            .find(|cards| !cards.is_empty())
    }
}

/// Numbers arrive as strings, empty when not applicable, and occasionally as
/// plain JSON numbers.
fn catalog_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) if s.trim().is_empty() => Ok(0),
        Raw::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| de::Error::custom(format!("expected a number, found {s:?}"))),
        Raw::Number(n) => {
            u32::try_from(n).map_err(|_| de::Error::custom(format!("number out of range: {n}")))
        }
    }
}

static EPISODES_WIDGET: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("rai-episodes").unwrap());

/// Addressing attributes of the `<rai-episodes>` widget on a programme page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodesWidget {
    pub base_path: String,
    pub block: String,
    pub set: String,
    pub episode_path: String,
}

impl EpisodesWidget {
    /// Reads the first widget in document order.
    pub fn from_document(document: &Html, page_url: &str) -> Result<Self> {
        let element = document.select(&EPISODES_WIDGET).next().ok_or_else(|| {
            CatalogError::resolution(page_url, "no <rai-episodes> element on the page")
        })?;

        let attr = |name: &str| {
            element
                .value()
                .attr(name)
                .map(str::to_owned)
                .ok_or_else(|| {
                    CatalogError::resolution(
                        page_url,
                        format!("<rai-episodes> is missing the `{name}` attribute"),
                    )
                })
        };

        Ok(Self {
            base_path: attr("base_path")?,
            block: attr("block")?,
            set: attr("set")?,
            episode_path: attr("episode_path")?,
        })
    }

    /// `<base_path>/<block>/<set>/<episode_path>` with no leading slash.
    pub fn listing_path(&self) -> String {
        [
            &self.base_path,
            &self.block,
            &self.set,
            &self.episode_path,
        ]
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
    }
}
