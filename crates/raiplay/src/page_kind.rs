use std::sync::LazyLock;

use regex::Regex;

pub static EPISODE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?raiplay\.it/video/[^?#]+\.html(?:[?#].*)?$").unwrap()
});

pub static SERIES_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?raiplay\.it/programmi/([A-Za-z0-9_-]+)/?(?:[?#].*)?$")
        .unwrap()
});

/// Which kind of RaiPlay page a url points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A single video page, `/video/...html`.
    Episode,
    /// A programme landing page, `/programmi/<slug>`.
    Series,
}

impl UrlKind {
    pub fn detect(url: &str) -> Option<Self> {
        let url = url.trim();
        if EPISODE_URL_REGEX.is_match(url) {
            Some(Self::Episode)
        } else if SERIES_URL_REGEX.is_match(url) {
            Some(Self::Series)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episode => "episode",
            Self::Series => "series",
        }
    }
}

impl std::fmt::Display for UrlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_episode_pages() {
        assert_eq!(
            UrlKind::detect(
                "https://www.raiplay.it/video/2021/05/Il-commissario-Montalbano-ep1-a1b2c3.html"
            ),
            Some(UrlKind::Episode)
        );
        assert_eq!(
            UrlKind::detect("raiplay.it/video/2020/01/film.html?wt_mc=2"),
            Some(UrlKind::Episode)
        );
    }

    #[test]
    fn detects_series_pages() {
        assert_eq!(
            UrlKind::detect("https://www.raiplay.it/programmi/ilcommissariomontalbano"),
            Some(UrlKind::Series)
        );
        assert_eq!(
            UrlKind::detect("https://www.raiplay.it/programmi/doc-nelle-tue-mani/"),
            Some(UrlKind::Series)
        );
    }

    #[test]
    fn rejects_other_sites() {
        assert_eq!(UrlKind::detect("https://www.example.com/video/a.html"), None);
        assert_eq!(UrlKind::detect("https://www.raiplay.it/dirette/rai1"), None);
    }
}
