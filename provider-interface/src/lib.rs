//! Raw record vocabulary shared between the streamdex pipeline and the
//! provider adapters that feed it. Adapters turn upstream payloads into these
//! records; everything canonical is built from them by the host crate.

// Shared between host and adapters
pub mod raw {
    use serde::{Deserialize, Serialize};

    use crate::taxonomy::TaxonomyFacet;
    use crate::Quality;

    /// One fetched upstream payload.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RawPage {
        pub url: String,
        pub text: String,
    }

    impl RawPage {
        pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
            Self { url: url.into(), text: text.into() }
        }
    }

    /// A catalog entry before URL normalization.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RawCatalogItem {
        pub title: String,
        pub detail_ref: String,
        pub thumbnail: String,
        pub poster: String,
    }

    /// A detail page's fields before taxonomy, aggregation and classification.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RawDetail {
        pub title: String,
        pub synopsis: String,
        pub poster: String,
        pub cast: Vec<String>,
        /// Tags the upstream lists directly, in addition to any genre facet.
        pub tags: Vec<String>,
        pub publish_year: Option<u32>,
        /// Positional four-slot category container, when the upstream has one.
        pub taxonomy: Option<[TaxonomyFacet; 4]>,
        pub status_label: String,
        pub duration_label: String,
        /// Separate page listing the episode rows. `None` means the rows live
        /// on the detail page itself.
        pub episodes_ref: Option<String>,
    }

    /// One (episode, server) pair as scattered by the upstream.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EpisodeRow {
        pub episode_name: String,
        /// Upstream identity of the episode (slug, id), carried in episode
        /// references.
        pub key: String,
        /// Ordering key, the episode name unless the upstream says otherwise.
        pub sort_key: String,
        pub server_label: String,
        pub stream_url: String,
        pub segmented: bool,
        pub referer: Option<String>,
        pub quality: Option<Quality>,
    }

    impl EpisodeRow {
        /// Row with no explicit referer or quality, sorted by its name. An
        /// empty `key` falls back to the episode name.
        pub fn new(
            episode_name: impl Into<String>,
            key: impl Into<String>,
            server_label: impl Into<String>,
            stream_url: impl Into<String>,
            segmented: bool,
        ) -> Self {
            let episode_name = episode_name.into();
            let mut key = key.into();
            if key.is_empty() {
                key = episode_name.clone();
            }
            Self {
                sort_key: episode_name.clone(),
                episode_name,
                key,
                server_label: server_label.into(),
                stream_url: stream_url.into(),
                segmented,
                referer: None,
                quality: None,
            }
        }

        pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
            self.sort_key = sort_key.into();
            self
        }

        pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
            self.referer = Some(referer.into());
            self
        }

        pub fn with_quality(mut self, quality: Quality) -> Self {
            self.quality = Some(quality);
            self
        }
    }
}

pub mod taxonomy {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FacetEntry {
        pub id: String,
        pub label: String,
    }

    /// A named taxonomy dimension (genre, year, country...).
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TaxonomyFacet {
        pub facet_name: String,
        pub entries: Vec<FacetEntry>,
    }
}

use serde::{Deserialize, Serialize};

/// Quality hint attached to a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Unknown,
    P360,
    P480,
    P720,
    P1080,
    P1440,
    P2160,
}

/// The upstream payload did not have the shape an adapter expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed {what}: {reason}")]
    Malformed { what: String, reason: String },

    #[error("missing {0}")]
    Missing(String),
}

impl ExtractError {
    pub fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed { what: what.into(), reason: reason.to_string() }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::Missing(what.into())
    }
}

// Common utilities and helper functions
pub mod utils {
    /// Last non-empty `/`-separated segment of a reference, or the whole
    /// reference when it has none.
    pub fn last_path_segment(reference: &str) -> &str {
        reference
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(reference)
    }

    /// Split a delimited upstream list ("A, B,C") into trimmed, non-empty items.
    pub fn split_list(raw: &str, sep: char) -> Vec<String> {
        raw.split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// First non-empty candidate.
    pub fn first_non_empty<'a>(candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|v| !v.trim().is_empty())
    }
}
