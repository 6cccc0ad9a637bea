pub mod adapters;
pub mod classify;
pub mod config;
pub mod db;
pub mod episodes;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod storage;
pub mod taxonomy;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::{ProviderConfig, SectionConfig};
    pub use crate::fetch::{CachedFetcher, Fetcher, HttpFetcher};
    pub use crate::provider::{Provider, ProviderAdapter};
    pub use crate::types::{CatalogItem, ContentType, DetailRecord, Episode, HomeSection, Quality, StreamSource};
    pub use crate::Catalog;
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;

use crate::config::{cache_ttl_secs, load_provider_configs};
use crate::db::Database;
use crate::error::Fault;
use crate::fetch::{current_epoch, CachedFetcher, Fetcher, HttpFetcher};
use crate::provider::Provider;
use crate::types::{CatalogItem, DetailRecord, HomeSection, StreamSource};

/// Loaded providers plus the fetcher every operation goes through.
pub struct Catalog {
    fetcher: Arc<dyn Fetcher>,
    db: Option<Database>,
    providers: Vec<Provider>,
}

impl Catalog {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher, db: None, providers: Vec::new() }
    }

    /// HTTP fetcher behind the SQLite fetch cache. Migrations run when asked.
    pub async fn connect(database_url: Option<&str>, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(database_url).await?;
        if run_migrations { db.run_migrations().await?; }
        let http: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        let cached = CachedFetcher::new(http, db.clone(), cache_ttl_secs());
        Ok(Self { fetcher: Arc::new(cached), db: Some(db), providers: Vec::new() })
    }

    /// Plain HTTP, nothing persisted.
    pub fn uncached() -> Result<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new()?)))
    }

    /// Register a provider, replacing any with the same name.
    pub fn add_provider(&mut self, provider: Provider) {
        match self.providers.iter_mut().find(|p| p.name() == provider.name()) {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    /// Load every provider config in `dir`. Returns how many were added.
    pub fn load_providers_from_directory(&mut self, dir: &Path) -> Result<usize> {
        let mut added = 0;
        for cfg in load_provider_configs(dir)? {
            let name = cfg.name.clone();
            match Provider::from_config(cfg) {
                Ok(provider) => {
                    tracing::info!(provider = %name, adapter = provider.adapter.key(), "loaded provider");
                    self.add_provider(provider);
                    added += 1;
                }
                Err(e) => tracing::warn!(provider = %name, error = %e, "skipping provider"),
            }
        }
        Ok(added)
    }

    pub fn list_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name() == name)
    }

    fn lookup(&self, name: &str, operation: &'static str) -> Option<&Provider> {
        let found = self.provider(name);
        if found.is_none() {
            let fault = Fault::UnknownProvider(name.to_string());
            tracing::warn!(provider = name, operation, fault = fault.kind(), error = %fault, "returning degraded result");
        }
        found
    }

    pub async fn browse(&self, provider: &str, page_ref: &str, page: u32) -> Vec<CatalogItem> {
        match self.lookup(provider, "browse") {
            Some(p) => pipeline::browse(self.fetcher.as_ref(), p, page_ref, page).await,
            None => Vec::new(),
        }
    }

    pub async fn search(&self, provider: &str, query: &str) -> Vec<CatalogItem> {
        match self.lookup(provider, "search") {
            Some(p) => pipeline::search(self.fetcher.as_ref(), p, query).await,
            None => Vec::new(),
        }
    }

    /// Search every provider concurrently; results keep provider order.
    pub async fn search_all(&self, query: &str) -> Vec<(String, Vec<CatalogItem>)> {
        let results = join_all(
            self.providers
                .iter()
                .map(|p| pipeline::search(self.fetcher.as_ref(), p, query)),
        )
        .await;
        self.list_providers().into_iter().zip(results).collect()
    }

    pub async fn home(&self, provider: &str, page: u32) -> Vec<HomeSection> {
        match self.lookup(provider, "home") {
            Some(p) => pipeline::home(self.fetcher.as_ref(), p, page).await,
            None => Vec::new(),
        }
    }

    pub async fn load_detail(&self, provider: &str, reference: &str) -> DetailRecord {
        match self.lookup(provider, "load_detail") {
            Some(p) => pipeline::load_detail(self.fetcher.as_ref(), p, reference).await,
            None => pipeline::sentinel_detail(reference),
        }
    }

    pub async fn resolve_streams(&self, provider: &str, episode_ref: &str) -> Vec<StreamSource> {
        match self.lookup(provider, "resolve_streams") {
            Some(p) => pipeline::resolve_streams(self.fetcher.as_ref(), p, episode_ref).await,
            None => Vec::new(),
        }
    }

    // --- Cache maintenance (no-ops without a database) ---

    /// Delete cached fetches whose key starts with `prefix` (all when `None`).
    pub async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64> {
        match &self.db {
            Some(db) => db.clear_cache_prefix(prefix).await,
            None => Ok(0),
        }
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        match &self.db {
            Some(db) => db.purge_expired(current_epoch()).await,
            None => Ok(0),
        }
    }

    pub async fn vacuum_db(&self) -> Result<()> {
        match &self.db {
            Some(db) => db.vacuum().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::adapters::NguonCAdapter;
    use crate::config::ProviderConfig;
    use crate::error::FetchError;
    use crate::fetch::{FetchRequest, FetchResponse};
    use crate::pipeline::FAILURE_TITLE;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for Recorder {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            self.calls.lock().unwrap().push(request.url.clone());
            Ok(FetchResponse {
                url: request.url.clone(),
                status: 200,
                text: r#"{"items": [{"name": "A", "slug": "a"}]}"#.to_string(),
            })
        }
    }

    fn provider(name: &str, base: &str) -> Provider {
        let cfg = ProviderConfig::from_toml_str(&format!(
            "name = \"{name}\"\nadapter = \"nguonc\"\nbase_url = \"{base}\"\nsearch_path = \"/search?q={{query}}\"\n"
        ))
        .unwrap();
        Provider::new(cfg, Arc::new(NguonCAdapter))
    }

    fn catalog() -> (Arc<Recorder>, Catalog) {
        let recorder = Arc::new(Recorder::default());
        let mut catalog = Catalog::new(recorder.clone());
        catalog.add_provider(provider("one", "https://one.test"));
        catalog.add_provider(provider("two", "https://two.test"));
        (recorder, catalog)
    }

    #[tokio::test]
    async fn dispatches_by_provider_name() {
        let (recorder, catalog) = catalog();
        let items = catalog.browse("two", "/list", 3).await;
        assert_eq!(items[0].detail_ref, "https://two.test/film/a");
        assert_eq!(recorder.calls.lock().unwrap().as_slice(), ["https://two.test/list?page=3"]);
    }

    #[tokio::test]
    async fn unknown_provider_degrades() {
        let (recorder, catalog) = catalog();
        assert!(catalog.browse("nope", "/list", 1).await.is_empty());
        assert!(catalog.search("nope", "x").await.is_empty());
        assert!(catalog.home("nope", 1).await.is_empty());
        assert!(catalog.resolve_streams("nope", "a@@@b").await.is_empty());
        assert_eq!(catalog.load_detail("nope", "https://x/film/abc").await.title, FAILURE_TITLE);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_all_tags_results_in_provider_order() {
        let (_, catalog) = catalog();
        let results = catalog.search_all("a").await;
        let names: Vec<_> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(results[1].1[0].detail_ref, "https://two.test/film/a");
    }

    #[tokio::test]
    async fn add_provider_replaces_same_name() {
        let (_, mut catalog) = catalog();
        catalog.add_provider(provider("one", "https://three.test"));
        assert_eq!(catalog.list_providers(), vec!["one", "two"]);
        assert_eq!(catalog.provider("one").unwrap().config.base_url, "https://three.test");
    }

    #[tokio::test]
    async fn loads_providers_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            "name = \"a\"\nadapter = \"motchill\"\nbase_url = \"https://a.test\"\nsearch_path = \"/?s={query}\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.toml"),
            "name = \"b\"\nadapter = \"missing\"\nbase_url = \"https://b.test\"\nsearch_path = \"/?s={query}\"\n",
        )
        .unwrap();
        let mut catalog = Catalog::new(Arc::new(Recorder::default()));
        assert_eq!(catalog.load_providers_from_directory(dir.path()).unwrap(), 1);
        assert_eq!(catalog.list_providers(), vec!["a"]);
        assert_eq!(catalog.clear_cache_prefix(None).await.unwrap(), 0);
    }
}
