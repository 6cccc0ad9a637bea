use provider_interface::raw::EpisodeRow;
use serde::{Deserialize, Serialize};

pub use provider_interface::taxonomy::{FacetEntry, TaxonomyFacet};
pub use provider_interface::Quality;

/// Separator between the detail reference and the episode key inside an
/// episode reference.
pub const EPISODE_REF_SEPARATOR: &str = "@@@";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub detail_ref: String,
    pub thumbnail_url: String,
    pub poster_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Movie,
    Series,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub server_label: String,
    pub stream_url: String,
    pub is_segmented: bool,
    pub referer: String,
    pub quality: Quality,
}

impl From<EpisodeRow> for StreamSource {
    fn from(row: EpisodeRow) -> Self {
        StreamSource {
            server_label: row.server_label,
            stream_url: row.stream_url,
            is_segmented: row.segmented,
            referer: row.referer.unwrap_or_default(),
            quality: row.quality.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub display_name: String,
    /// Identifies the episode inside its detail record; unique there.
    pub key: String,
    pub sort_key: String,
    /// Opaque reference accepted by `resolve_streams`.
    pub reference: String,
    pub servers: Vec<StreamSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub title: String,
    pub synopsis: String,
    pub poster_url: String,
    /// 0 when unknown.
    pub publish_year: u32,
    pub tags: Vec<String>,
    pub cast: Vec<String>,
    pub content_type: ContentType,
    pub episodes: Vec<Episode>,
    pub recommendations: Vec<CatalogItem>,
}

/// A named home-page row of catalog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeSection {
    pub name: String,
    pub horizontal: bool,
    pub items: Vec<CatalogItem>,
}

/// `<detail_ref>@@@<episode key>`, the reference carried by every [`Episode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub detail_ref: String,
    pub key: String,
}

impl EpisodeRef {
    pub fn new(detail_ref: impl Into<String>, key: impl Into<String>) -> Self {
        Self { detail_ref: detail_ref.into(), key: key.into() }
    }

    /// `None` when the separator is absent or the detail part is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (detail_ref, key) = raw.split_once(EPISODE_REF_SEPARATOR)?;
        if detail_ref.is_empty() {
            return None;
        }
        Some(Self::new(detail_ref, key))
    }
}

impl std::fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.detail_ref, EPISODE_REF_SEPARATOR, self.key)
    }
}
