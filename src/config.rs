use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::classify::Markers;
use crate::fetch::FetchRequest;
use crate::normalize::normalize;
use crate::types::{ContentType, Quality};

/// How a listing URL is turned into page N.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pagination {
    /// `?page=N`, or `&page=N` when the URL already has a query.
    #[default]
    Query,
    /// `/page-N`
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub page_ref: String,
    #[serde(default)]
    pub horizontal: bool,
}

/// Immutable per-provider settings, one TOML file per provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Key of the adapter that understands this upstream.
    pub adapter: String,
    pub base_url: String,
    #[serde(default)]
    pub image_base: Option<String>,
    /// Search page relative to `base_url`, with a `{query}` placeholder.
    pub search_path: String,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Referer for streams whose rows carry none. Defaults to the detail ref.
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub quality: Quality,
    /// Listing used to fill a detail record's recommendations.
    #[serde(default)]
    pub recommendations: Option<String>,
    /// Recommendations for titles classified as movies, over `recommendations`.
    #[serde(default)]
    pub movie_recommendations: Option<String>,
    #[serde(default)]
    pub series_recommendations: Option<String>,
    /// Per-episode stream endpoint with `{slug}` and `{episode}` placeholders,
    /// for adapters whose episode lists carry no playable links.
    #[serde(default)]
    pub stream_path: Option<String>,
    /// Proxy prefixed to streams that cannot be played directly.
    #[serde(default)]
    pub stream_proxy: Option<String>,
    #[serde(default = "default_genre_facet")]
    pub genre_facet: String,
    #[serde(default = "default_year_facet")]
    pub year_facet: String,
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

fn default_genre_facet() -> String {
    "Genre".to_string()
}

fn default_year_facet() -> String {
    "Year".to_string()
}

impl ProviderConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut cfg: ProviderConfig = toml::from_str(raw).context("parsing provider config")?;
        cfg.base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
        if let Some(img) = cfg.image_base.as_mut() {
            *img = img.trim().trim_end_matches('/').to_string();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading provider config: {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("provider name must not be empty");
        }
        if !self.base_url.starts_with("http") {
            bail!("provider `{}` base_url must be absolute (got `{}`)", self.name, self.base_url);
        }
        if !self.search_path.contains("{query}") {
            bail!("provider `{}` search_path lacks a {{query}} placeholder", self.name);
        }
        Ok(())
    }

    pub fn image_base(&self) -> &str {
        self.image_base.as_deref().unwrap_or(&self.base_url)
    }

    /// Absolute URL for page `page` of a listing.
    pub fn page_url(&self, page_ref: &str, page: u32) -> String {
        let url = normalize(page_ref, &self.base_url);
        match self.pagination {
            Pagination::Query if url.contains('?') => format!("{url}&page={page}"),
            Pagination::Query => format!("{url}?page={page}"),
            Pagination::Path => format!("{}/page-{page}", url.trim_end_matches('/')),
        }
    }

    /// Absolute URL of the first search page for `query`.
    pub fn search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        normalize(&self.search_path.replace("{query}", &encoded), &self.base_url)
    }

    /// GET request carrying this provider's headers and timeout.
    pub fn request(&self, url: impl Into<String>) -> FetchRequest {
        FetchRequest::get(url)
            .headers(&self.headers)
            .timeout(self.call_timeout_ms.map(Duration::from_millis))
    }

    /// Form POST carrying this provider's headers and timeout.
    pub fn form_request<'a, I>(&self, url: impl Into<String>, form: I) -> FetchRequest
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        FetchRequest::post(url, body)
            .headers(&self.headers)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .timeout(self.call_timeout_ms.map(Duration::from_millis))
    }

    /// Listing that recommends titles like one of type `content_type`.
    pub fn recommendations_for(&self, content_type: ContentType) -> Option<&str> {
        let specific = match content_type {
            ContentType::Movie => self.movie_recommendations.as_deref(),
            ContentType::Series => self.series_recommendations.as_deref(),
        };
        specific
            .or(self.recommendations.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Absolute stream endpoint of one episode, when `stream_path` is set.
    pub fn stream_url(&self, slug: &str, episode: &str) -> Option<String> {
        self.stream_path.as_deref().map(|path| {
            normalize(&path.replace("{slug}", slug).replace("{episode}", episode), &self.base_url)
        })
    }
}

/// Load every `*.toml` provider config in `dir`. Files that fail to parse are
/// logged and skipped; a missing directory yields nothing.
pub fn load_provider_configs(dir: &Path) -> Result<Vec<ProviderConfig>> {
    if !dir.exists() {
        tracing::info!(dir = %dir.display(), "provider directory does not exist");
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing provider directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("toml"))
        .collect();
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        match ProviderConfig::load(&path) {
            Ok(cfg) => configs.push(cfg),
            Err(e) => tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping provider config"),
        }
    }
    Ok(configs)
}

/// Fetch cache lifetime, `STREAMDEX_CACHE_TTL_SECS` or one hour.
pub fn cache_ttl_secs() -> i64 {
    std::env::var("STREAMDEX_CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60 * 60)
}

/// `<config dir>/providers` for the current user.
pub fn default_providers_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "streamdex", "streamdex").map(|p| p.config_dir().join("providers"))
}
