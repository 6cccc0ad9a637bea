use std::sync::Arc;

use provider_interface::raw::{EpisodeRow, RawCatalogItem, RawDetail, RawPage};
use provider_interface::ExtractError;

use crate::adapters::{MotChillAdapter, MthApiAdapter, NguonCAdapter, PhimMoiChillAdapter};
use crate::config::ProviderConfig;
use crate::fetch::FetchRequest;
use crate::types::StreamSource;

/// Per-upstream extraction rules. Implementations are pure: they never fetch,
/// and the pipeline never asks which upstream it is talking to.
pub trait ProviderAdapter: Send + Sync {
    /// Key used by `adapter = "..."` in provider configs.
    fn key(&self) -> &'static str;

    /// Catalog entries of a listing or search page.
    fn extract_catalog_items(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<RawCatalogItem>, ExtractError>;

    fn extract_detail(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<RawDetail, ExtractError>;

    /// Episode/server rows of the page named by `RawDetail::episodes_ref`, or
    /// of the detail page itself.
    fn extract_episode_rows(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<EpisodeRow>, ExtractError>;

    /// Requests that turn an aggregated mirror into playable streams. Empty
    /// when the mirror's `stream_url` is already playable.
    fn stream_requests(&self, _cfg: &ProviderConfig, _source: &StreamSource) -> Vec<FetchRequest> {
        Vec::new()
    }

    /// Streams in the response to `stream_requests(..)[index]`.
    fn extract_streams(
        &self,
        _cfg: &ProviderConfig,
        _source: &StreamSource,
        _index: usize,
        _page: &RawPage,
    ) -> Result<Vec<EpisodeRow>, ExtractError> {
        Ok(Vec::new())
    }
}

/// Adapters compiled into this crate.
pub fn builtin_adapters() -> Vec<Arc<dyn ProviderAdapter>> {
    vec![
        Arc::new(NguonCAdapter),
        Arc::new(MotChillAdapter),
        Arc::new(PhimMoiChillAdapter),
        Arc::new(MthApiAdapter),
    ]
}

pub fn adapter_for(key: &str) -> Option<Arc<dyn ProviderAdapter>> {
    builtin_adapters().into_iter().find(|a| a.key() == key)
}

/// A configured upstream: its settings plus the adapter that reads it.
#[derive(Clone)]
pub struct Provider {
    pub config: ProviderConfig,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl Provider {
    pub fn new(config: ProviderConfig, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self { config, adapter }
    }

    /// Pair `config` with the built-in adapter it names.
    pub fn from_config(config: ProviderConfig) -> anyhow::Result<Self> {
        let adapter = adapter_for(&config.adapter)
            .ok_or_else(|| anyhow::anyhow!("provider `{}` names unknown adapter `{}`", config.name, config.adapter))?;
        Ok(Self::new(config, adapter))
    }

    pub fn name(&self) -> &str { &self.config.name }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.config.name)
            .field("adapter", &self.adapter.key())
            .finish()
    }
}
