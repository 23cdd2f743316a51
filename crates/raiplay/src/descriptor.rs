use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A fully resolved, immutable request to download one video.
///
/// Built once by the resolver and then moved into a download job. Equality is
/// structural over every field.
///
/// # Examples
///
/// ```rust
/// use raiplay_parser::Descriptor;
///
/// let d = Descriptor::new(
///     "https://www.raiplay.it/video/2021/05/ep1.html",
///     "Episode 1",
///     2,
///     1,
///     "https://mediapolis.rai.it/relinker/relinkerServlet.htm?cont=abc",
/// )
/// .unwrap();
/// assert_eq!(d.to_string(), "Request[Episode 1]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct Descriptor {
    source_url: String,
    title: String,
    season: u32,
    episode: u32,
    content_url: String,
}

impl Descriptor {
    /// Creates a descriptor, rejecting empty url, title or content url.
    ///
    /// `season` and `episode` use `0` for "not applicable".
    pub fn new(
        source_url: impl Into<String>,
        title: impl Into<String>,
        season: u32,
        episode: u32,
        content_url: impl Into<String>,
    ) -> Result<Self> {
        let source_url = source_url.into();
        let title = title.into();
        let content_url = content_url.into();

        for (field, value) in [
            ("source url", &source_url),
            ("title", &title),
            ("content url", &content_url),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::resolution(
                    source_url.clone(),
                    format!("empty {field}"),
                ));
            }
        }

        Ok(Self {
            source_url,
            title,
            season,
            episode,
            content_url,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn content_url(&self) -> &str {
        &self.content_url
    }
}

/// Unchecked wire form; deserialization goes through [`Descriptor::new`].
#[derive(Deserialize)]
struct RawDescriptor {
    source_url: String,
    title: String,
    season: u32,
    episode: u32,
    content_url: String,
}

impl TryFrom<RawDescriptor> for Descriptor {
    type Error = CatalogError;

    fn try_from(raw: RawDescriptor) -> Result<Self> {
        Self::new(
            raw.source_url,
            raw.title,
            raw.season,
            raw.episode,
            raw.content_url,
        )
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request[{}]", self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_title() {
        let err = Descriptor::new("https://x/video/a.html", "  ", 0, 0, "https://x/m3u8")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Resolution { .. }));
    }

    #[test]
    fn rejects_empty_content_url() {
        assert!(Descriptor::new("https://x/video/a.html", "A", 0, 0, "").is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a = Descriptor::new("u", "t", 1, 2, "c").unwrap();
        let b = Descriptor::new("u", "t", 1, 2, "c").unwrap();
        let c = Descriptor::new("u", "t", 1, 3, "c").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn deserializing_validates_fields() {
        let blank = r#"{"source_url":"","title":"","season":0,"episode":0,"content_url":""}"#;
        assert!(serde_json::from_str::<Descriptor>(blank).is_err());

        let no_title = r#"{"source_url":"https://x/video/a.html","title":" ","season":1,"episode":2,"content_url":"https://x/a.m3u8"}"#;
        let err = serde_json::from_str::<Descriptor>(no_title).unwrap_err();
        assert!(err.to_string().contains("empty title"));
    }

    #[test]
    fn serialized_descriptor_reads_back() {
        let d = Descriptor::new("https://x/video/a.html", "A", 1, 2, "https://x/a.m3u8").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(serde_json::from_str::<Descriptor>(&json).unwrap(), d);
    }
}
