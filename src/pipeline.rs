//! Browse / Search / Detail / ResolveStreams orchestration.
//!
//! Every operation is stateless: its only inputs are its arguments, the
//! provider's immutable config and the fetcher. Faults stop here. They are
//! logged and turned into the degraded output of each operation:
//!
//! | operation        | on fault                     |
//! |------------------|------------------------------|
//! | browse / search  | empty list (whole page)      |
//! | home             | empty items for that section |
//! | load_detail      | sentinel [`DetailRecord`]    |
//! | resolve_streams  | empty list                   |

use futures::future::join_all;
use provider_interface::raw::{EpisodeRow, RawDetail, RawPage};
use provider_interface::utils::last_path_segment;

use crate::classify::classify_with;
use crate::error::Fault;
use crate::episodes::{aggregate, assign_unique_keys};
use crate::fetch::{Fetcher, MemoFetcher};
use crate::normalize::normalize;
use crate::provider::Provider;
use crate::taxonomy::{facet_labels, facet_year};
use crate::types::{CatalogItem, ContentType, DetailRecord, Episode, EpisodeRef, HomeSection, StreamSource};

/// Title of the placeholder record returned when a detail page cannot load.
pub const FAILURE_TITLE: &str = "Something went wrong!";

/// Placeholder detail record naming the reference that failed.
pub fn sentinel_detail(reference: &str) -> DetailRecord {
    DetailRecord {
        title: FAILURE_TITLE.to_string(),
        synopsis: format!(
            "There's a problem loading this content. (CODE: {})",
            last_path_segment(reference)
        ),
        ..DetailRecord::default()
    }
}

fn log_fault(provider: &Provider, operation: &'static str, reference: &str, fault: &Fault) {
    tracing::warn!(
        provider = %provider.name(),
        operation,
        fault = fault.kind(),
        reference,
        error = %fault,
        "upstream fault, returning degraded result"
    );
}

/// Normalize an asset URL, leaving absent assets empty.
fn asset(candidate: &str, base: &str) -> String {
    if candidate.trim().is_empty() {
        String::new()
    } else {
        normalize(candidate.trim(), base)
    }
}

async fn fetch_page(fetcher: &dyn Fetcher, provider: &Provider, url: &str) -> Result<RawPage, Fault> {
    let response = fetcher.fetch(&provider.config.request(url)).await?;
    Ok(RawPage::new(response.url, response.text))
}

async fn try_catalog(fetcher: &dyn Fetcher, provider: &Provider, url: &str) -> Result<Vec<CatalogItem>, Fault> {
    let cfg = &provider.config;
    let page = fetch_page(fetcher, provider, url).await?;
    let raw = provider.adapter.extract_catalog_items(cfg, &page)?;
    Ok(raw
        .into_iter()
        .map(|item| CatalogItem {
            title: item.title.trim().to_string(),
            detail_ref: normalize(item.detail_ref.trim(), &cfg.base_url),
            thumbnail_url: asset(&item.thumbnail, cfg.image_base()),
            poster_url: asset(&item.poster, cfg.image_base()),
        })
        .collect())
}

async fn catalog_or_empty(
    fetcher: &dyn Fetcher,
    provider: &Provider,
    operation: &'static str,
    url: &str,
) -> Vec<CatalogItem> {
    match try_catalog(fetcher, provider, url).await {
        Ok(items) => {
            tracing::debug!(provider = %provider.name(), operation, url, count = items.len(), "catalog page");
            items
        }
        Err(fault) => {
            log_fault(provider, operation, url, &fault);
            Vec::new()
        }
    }
}

/// Page `page` of the listing `page_ref`.
pub async fn browse(fetcher: &dyn Fetcher, provider: &Provider, page_ref: &str, page: u32) -> Vec<CatalogItem> {
    let url = provider.config.page_url(page_ref, page);
    catalog_or_empty(fetcher, provider, "browse", &url).await
}

/// First page of search results. A blank query is an empty result.
pub async fn search(fetcher: &dyn Fetcher, provider: &Provider, query: &str) -> Vec<CatalogItem> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let url = provider.config.search_url(query);
    catalog_or_empty(fetcher, provider, "search", &url).await
}

/// Every configured home section, fetched concurrently, in config order.
pub async fn home(fetcher: &dyn Fetcher, provider: &Provider, page: u32) -> Vec<HomeSection> {
    let sections = &provider.config.sections;
    let pages = join_all(
        sections
            .iter()
            .map(|s| browse(fetcher, provider, &s.page_ref, page)),
    )
    .await;
    sections
        .iter()
        .zip(pages)
        .map(|(s, items)| HomeSection { name: s.name.clone(), horizontal: s.horizontal, items })
        .collect()
}

/// Fill the provider's referer and quality defaults into a row.
fn with_stream_defaults(provider: &Provider, detail_ref: &str, mut row: EpisodeRow) -> EpisodeRow {
    let cfg = &provider.config;
    if row.referer.as_deref().map_or(true, str::is_empty) {
        row.referer = Some(cfg.referer.clone().unwrap_or_else(|| detail_ref.to_string()));
    }
    row.quality.get_or_insert(cfg.quality);
    row
}

/// Aggregate rows into episodes, filling stream defaults and references.
fn build_episodes(provider: &Provider, detail_ref: &str, rows: Vec<EpisodeRow>) -> Vec<Episode> {
    let rows = rows.into_iter().map(|row| with_stream_defaults(provider, detail_ref, row));
    let mut episodes = aggregate(rows);
    assign_unique_keys(&mut episodes);
    for episode in &mut episodes {
        episode.reference = EpisodeRef::new(detail_ref, episode.key.as_str()).to_string();
    }
    episodes
}

/// Fetch and extract a detail page plus its episode rows.
async fn load_raw_detail(
    fetcher: &dyn Fetcher,
    provider: &Provider,
    detail_url: &str,
) -> Result<(RawDetail, Vec<Episode>), Fault> {
    let cfg = &provider.config;
    let page = fetch_page(fetcher, provider, detail_url).await?;
    let raw = provider.adapter.extract_detail(cfg, &page)?;
    let rows = match raw.episodes_ref.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(episodes_ref) => {
            let listing = fetch_page(fetcher, provider, &normalize(episodes_ref, &cfg.base_url)).await?;
            provider.adapter.extract_episode_rows(cfg, &listing)?
        }
        None => provider.adapter.extract_episode_rows(cfg, &page)?,
    };
    let episodes = build_episodes(provider, detail_url, rows);
    Ok((raw, episodes))
}

async fn try_detail(fetcher: &dyn Fetcher, provider: &Provider, reference: &str) -> Result<DetailRecord, Fault> {
    let cfg = &provider.config;
    let detail_url = normalize(reference.trim(), &cfg.base_url);
    let (raw, episodes) = load_raw_detail(fetcher, provider, &detail_url).await?;

    let mut tags = raw.tags;
    let mut publish_year = raw.publish_year;
    if let Some(facets) = &raw.taxonomy {
        tags.extend(facet_labels(facets, &cfg.genre_facet));
        publish_year = publish_year.or_else(|| facet_year(facets, &cfg.year_facet));
    }
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| !t.is_empty() && seen.insert(t.clone()));

    let content_type = classify_with(&cfg.markers, episodes.len(), &raw.duration_label, &raw.status_label);

    Ok(DetailRecord {
        title: raw.title,
        synopsis: raw.synopsis,
        poster_url: asset(&raw.poster, cfg.image_base()),
        publish_year: publish_year.unwrap_or(0),
        tags,
        cast: raw.cast,
        content_type,
        episodes,
        recommendations: Vec::new(),
    })
}

async fn recommendations(fetcher: &dyn Fetcher, provider: &Provider, content_type: ContentType) -> Vec<CatalogItem> {
    match provider.config.recommendations_for(content_type) {
        Some(page_ref) => browse(fetcher, provider, page_ref, 1).await,
        None => Vec::new(),
    }
}

/// Detail record for `reference`, or the sentinel record on any fault.
///
/// Both recommendation listings are fetched alongside the primary page, and
/// the one matching the classified type is kept. Their failure only empties
/// `recommendations`.
pub async fn load_detail(fetcher: &dyn Fetcher, provider: &Provider, reference: &str) -> DetailRecord {
    let memo = MemoFetcher::new(fetcher);
    let (detail, for_movie, for_series) = futures::join!(
        try_detail(&memo, provider, reference),
        recommendations(&memo, provider, ContentType::Movie),
        recommendations(&memo, provider, ContentType::Series),
    );
    match detail {
        Ok(mut record) => {
            record.recommendations = match record.content_type {
                ContentType::Movie => for_movie,
                ContentType::Series => for_series,
            };
            record
        }
        Err(fault) => {
            log_fault(provider, "load_detail", reference, &fault);
            sentinel_detail(reference)
        }
    }
}

/// Run the adapter's follow-up requests for one mirror. A mirror that needs
/// none is returned as is.
async fn expand_source(
    fetcher: &dyn Fetcher,
    provider: &Provider,
    detail_url: &str,
    source: StreamSource,
) -> Result<Vec<StreamSource>, Fault> {
    let cfg = &provider.config;
    let requests = provider.adapter.stream_requests(cfg, &source);
    if requests.is_empty() {
        return Ok(vec![source]);
    }
    let responses = join_all(requests.iter().map(|r| fetcher.fetch(r))).await;
    let mut streams = Vec::new();
    for (index, response) in responses.into_iter().enumerate() {
        let response = response?;
        let page = RawPage::new(response.url, response.text);
        let rows = provider.adapter.extract_streams(cfg, &source, index, &page)?;
        streams.extend(
            rows.into_iter()
                .filter(|row| !row.stream_url.is_empty())
                .map(|row| StreamSource::from(with_stream_defaults(provider, detail_url, row))),
        );
    }
    Ok(streams)
}

async fn try_resolve(fetcher: &dyn Fetcher, provider: &Provider, target: &EpisodeRef) -> Result<Vec<StreamSource>, Fault> {
    let detail_url = normalize(target.detail_ref.trim(), &provider.config.base_url);
    let (_, episodes) = load_raw_detail(fetcher, provider, &detail_url).await?;
    let Some(episode) = episodes.into_iter().find(|e| e.key == target.key) else {
        tracing::debug!(provider = %provider.name(), key = %target.key, "episode not found");
        return Ok(Vec::new());
    };
    let expanded = join_all(
        episode
            .servers
            .into_iter()
            .map(|source| expand_source(fetcher, provider, &detail_url, source)),
    )
    .await;
    let mut streams = Vec::new();
    for sources in expanded {
        streams.extend(sources?);
    }
    Ok(streams)
}

/// Every mirror of the episode named by `episode_ref`. An unknown episode is
/// an empty result.
pub async fn resolve_streams(fetcher: &dyn Fetcher, provider: &Provider, episode_ref: &str) -> Vec<StreamSource> {
    let Some(target) = EpisodeRef::parse(episode_ref) else {
        tracing::debug!(provider = %provider.name(), episode_ref, "not an episode reference");
        return Vec::new();
    };
    if target.key.is_empty() {
        return Vec::new();
    }
    let memo = MemoFetcher::new(fetcher);
    match try_resolve(&memo, provider, &target).await {
        Ok(sources) => sources,
        Err(fault) => {
            log_fault(provider, "resolve_streams", episode_ref, &fault);
            Vec::new()
        }
    }
}
