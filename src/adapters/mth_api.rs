//! JSON API fronting several upstreams (KKPhim, AnimeHay): `{data: ...}`
//! envelopes, camelCase fields, and a per-episode endpoint that lists the
//! playable mirrors.
//!
//! Movies carry a `type` of `single` or `series`. It is reported as both the
//! status and the duration label, so configs classify with
//! `completed = ["single"]` and `episodic = ["series"]`.

use provider_interface::raw::{EpisodeRow, RawCatalogItem, RawDetail, RawPage};
use provider_interface::utils::last_path_segment;
use provider_interface::ExtractError;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::fetch::FetchRequest;
use crate::normalize::normalize;
use crate::provider::ProviderAdapter;
use crate::types::StreamSource;

const DEFAULT_STREAM_PATH: &str = "/episodes/{slug}/{episode}";

#[derive(Debug, Clone, Copy, Default)]
pub struct MthApiAdapter;

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Page {
    items: Vec<ListItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    name: String,
    slug: String,
    #[serde(default)]
    thumb_url: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Movie {
    name: String,
    slug: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    thumb_url: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
    #[serde(default)]
    publish_year: Option<u32>,
    #[serde(default)]
    casts: Vec<Cast>,
    #[serde(default)]
    categories: Vec<Category>,
    /// Present when the upstream embeds its episode list.
    #[serde(default)]
    episodes: Option<Vec<EpisodeItem>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cast {
    Name(String),
    Person { name: String },
}

impl Cast {
    fn into_name(self) -> String {
        match self {
            Cast::Name(name) | Cast::Person { name } => name.trim().to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Category {
    name: String,
}

#[derive(Deserialize)]
struct EpisodeItem {
    name: String,
    slug: String,
}

/// Episode listing endpoint, or a movie document with embedded episodes.
#[derive(Deserialize)]
#[serde(untagged)]
enum EpisodeSource {
    Listing(Vec<EpisodeItem>),
    Embedded { slug: String, episodes: Vec<EpisodeItem> },
}

#[derive(Deserialize)]
struct EpisodeStreams {
    #[serde(default)]
    episodes: Vec<Mirror>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Mirror {
    server: String,
    #[serde(default)]
    link_m3u8: String,
}

fn parse<T: serde::de::DeserializeOwned>(page: &RawPage, what: &str) -> Result<T, ExtractError> {
    serde_json::from_str::<Envelope<T>>(&page.text)
        .map(|e| e.data)
        .map_err(|e| ExtractError::malformed(what, e))
}

fn episode_url(cfg: &ProviderConfig, movie_slug: &str, episode_slug: &str) -> String {
    cfg.stream_url(movie_slug, episode_slug).unwrap_or_else(|| {
        let path = DEFAULT_STREAM_PATH.replace("{slug}", movie_slug).replace("{episode}", episode_slug);
        normalize(&path, &cfg.base_url)
    })
}

impl ProviderAdapter for MthApiAdapter {
    fn key(&self) -> &'static str { "mth-api" }

    fn extract_catalog_items(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<RawCatalogItem>, ExtractError> {
        let listing: Page = parse(page, "listing")?;
        Ok(listing
            .items
            .into_iter()
            .map(|item| RawCatalogItem {
                title: item.name,
                detail_ref: format!("{}/movie/{}", cfg.base_url, item.slug),
                thumbnail: item.thumb_url.unwrap_or_default(),
                poster: item.poster_url.unwrap_or_default(),
            })
            .collect())
    }

    fn extract_detail(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<RawDetail, ExtractError> {
        let movie: Movie = parse(page, "movie")?;
        let poster = movie
            .poster_url
            .filter(|p| !p.trim().is_empty())
            .or(movie.thumb_url)
            .unwrap_or_default();
        let episodes_ref = match &movie.episodes {
            Some(_) => None,
            None => Some(format!("{}/episodes/{}", cfg.base_url, movie.slug)),
        };
        Ok(RawDetail {
            title: movie.name,
            synopsis: movie.content.unwrap_or_default(),
            poster,
            cast: movie
                .casts
                .into_iter()
                .map(Cast::into_name)
                .filter(|c| !c.is_empty())
                .collect(),
            tags: movie.categories.into_iter().map(|c| c.name).collect(),
            publish_year: movie.publish_year.filter(|y| *y > 0),
            taxonomy: None,
            status_label: movie.kind.clone(),
            duration_label: movie.kind,
            episodes_ref,
        })
    }

    fn extract_episode_rows(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<EpisodeRow>, ExtractError> {
        let (movie_slug, episodes) = match parse::<EpisodeSource>(page, "episodes")? {
            EpisodeSource::Listing(episodes) => (last_path_segment(&page.url).to_string(), episodes),
            EpisodeSource::Embedded { slug, episodes } => (slug, episodes),
        };
        Ok(episodes
            .into_iter()
            .map(|ep| {
                let url = episode_url(cfg, &movie_slug, &ep.slug);
                EpisodeRow::new(ep.name, ep.slug, cfg.name.as_str(), url, true)
            })
            .collect())
    }

    fn stream_requests(&self, cfg: &ProviderConfig, source: &StreamSource) -> Vec<FetchRequest> {
        vec![cfg.request(source.stream_url.as_str())]
    }

    fn extract_streams(
        &self,
        _cfg: &ProviderConfig,
        _source: &StreamSource,
        _index: usize,
        page: &RawPage,
    ) -> Result<Vec<EpisodeRow>, ExtractError> {
        let streams: EpisodeStreams = parse(page, "episode streams")?;
        Ok(streams
            .episodes
            .into_iter()
            .filter(|m| !m.link_m3u8.trim().is_empty())
            .map(|m| EpisodeRow::new(m.server.as_str(), "", m.server.as_str(), m.link_m3u8.trim(), true))
            .collect())
    }
}
