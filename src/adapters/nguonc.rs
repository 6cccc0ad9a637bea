//! JSON API in the nguonc shape: `{items: [...]}` listings and
//! `{movie: {...}}` detail documents whose episodes are grouped per server.

use provider_interface::raw::{EpisodeRow, RawCatalogItem, RawDetail, RawPage};
use provider_interface::taxonomy::{FacetEntry, TaxonomyFacet};
use provider_interface::utils::split_list;
use provider_interface::ExtractError;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::provider::ProviderAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct NguonCAdapter;

#[derive(Deserialize)]
struct ListResponse {
    items: Vec<ListItem>,
}

#[derive(Deserialize)]
struct ListItem {
    name: String,
    slug: String,
    #[serde(default)]
    thumb_url: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
}

#[derive(Deserialize)]
struct DetailResponse {
    movie: Movie,
}

#[derive(Deserialize)]
struct Movie {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumb_url: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
    #[serde(default)]
    casts: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    current_episode: Option<String>,
    #[serde(default)]
    category: Option<CategoryContainer>,
    #[serde(default)]
    episodes: Vec<ServerGroup>,
}

/// Four facet slots keyed by position; only the embedded group name says
/// which is which.
#[derive(Deserialize)]
struct CategoryContainer {
    #[serde(rename = "1")]
    slot1: CategorySlot,
    #[serde(rename = "2")]
    slot2: CategorySlot,
    #[serde(rename = "3")]
    slot3: CategorySlot,
    #[serde(rename = "4")]
    slot4: CategorySlot,
}

#[derive(Deserialize)]
struct CategorySlot {
    group: IdName,
    #[serde(default)]
    list: Vec<IdName>,
}

#[derive(Deserialize)]
struct IdName {
    #[serde(default)]
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct ServerGroup {
    server_name: String,
    #[serde(default)]
    items: Vec<ServerItem>,
}

#[derive(Deserialize)]
struct ServerItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    m3u8: String,
    #[serde(default)]
    embed: String,
}

impl From<CategorySlot> for TaxonomyFacet {
    fn from(slot: CategorySlot) -> Self {
        TaxonomyFacet {
            facet_name: slot.group.name,
            entries: slot
                .list
                .into_iter()
                .map(|e| FacetEntry { id: e.id, label: e.name })
                .collect(),
        }
    }
}

impl CategoryContainer {
    fn into_facets(self) -> [TaxonomyFacet; 4] {
        [self.slot1.into(), self.slot2.into(), self.slot3.into(), self.slot4.into()]
    }
}

fn parse<T: serde::de::DeserializeOwned>(page: &RawPage, what: &str) -> Result<T, ExtractError> {
    serde_json::from_str(&page.text).map_err(|e| ExtractError::malformed(what, e))
}

impl ProviderAdapter for NguonCAdapter {
    fn key(&self) -> &'static str { "nguonc" }

    fn extract_catalog_items(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<RawCatalogItem>, ExtractError> {
        let list: ListResponse = parse(page, "nguonc listing")?;
        Ok(list
            .items
            .into_iter()
            .map(|item| RawCatalogItem {
                title: item.name,
                detail_ref: format!("{}/film/{}", cfg.base_url, item.slug),
                thumbnail: item.thumb_url.unwrap_or_default(),
                poster: item.poster_url.unwrap_or_default(),
            })
            .collect())
    }

    fn extract_detail(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<RawDetail, ExtractError> {
        let DetailResponse { movie } = parse(page, "nguonc detail")?;
        let poster = movie
            .poster_url
            .filter(|p| !p.is_empty())
            .or(movie.thumb_url)
            .unwrap_or_default();
        Ok(RawDetail {
            title: movie.name,
            synopsis: movie.description.unwrap_or_default(),
            poster,
            cast: split_list(movie.casts.as_deref().unwrap_or_default(), ','),
            tags: Vec::new(),
            publish_year: None,
            taxonomy: movie.category.map(CategoryContainer::into_facets),
            status_label: movie.current_episode.unwrap_or_default(),
            duration_label: movie.time.unwrap_or_default(),
            episodes_ref: None,
        })
    }

    fn extract_episode_rows(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<EpisodeRow>, ExtractError> {
        let DetailResponse { movie } = parse(page, "nguonc episodes")?;
        let mut rows = Vec::new();
        for group in movie.episodes {
            for item in group.items {
                let stream_url = if item.embed.is_empty() {
                    item.m3u8
                } else {
                    item.embed.replace("embed.php", "get.php")
                };
                let referer = stream_url.clone();
                rows.push(
                    EpisodeRow::new(item.name, item.slug, group.server_name.clone(), stream_url, true)
                        .with_referer(referer),
                );
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ProviderConfig {
        ProviderConfig::from_toml_str(
            r#"
            name = "nguonc"
            adapter = "nguonc"
            base_url = "https://phim.nguonc.com/api"
            search_path = "/films/search?keyword={query}"
            "#,
        )
        .unwrap()
    }

    const DETAIL: &str = r#"{
        "status": "success",
        "movie": {
            "name": "Thám Tử Lừng Danh",
            "slug": "tham-tu",
            "description": "Một cậu bé thám tử.",
            "thumb_url": "https://img/thumb.jpg",
            "poster_url": "",
            "casts": "Minami Takayama, Wakana Yamazaki,",
            "time": "24 phút/tập",
            "current_episode": "Hoàn tất (2/2)",
            "category": {
                "1": {"group": {"id": "g1", "name": "Định dạng"}, "list": [{"id": "a", "name": "Phim bộ"}]},
                "2": {"group": {"id": "g2", "name": "Thể loại"}, "list": [{"id": "b", "name": "Hoạt Hình"}, {"id": "c", "name": "Hình Sự"}]},
                "3": {"group": {"id": "g3", "name": "Năm"}, "list": [{"id": "d", "name": "1996"}]},
                "4": {"group": {"id": "g4", "name": "Quốc gia"}, "list": [{"id": "e", "name": "Nhật Bản"}]}
            },
            "episodes": [
                {"server_name": "Vietsub #1", "items": [
                    {"name": "1", "slug": "tap-1", "embed": "https://embed/embed.php?h=1", "m3u8": "https://m/1.m3u8"},
                    {"name": "2", "slug": "tap-2", "embed": "", "m3u8": "https://m/2.m3u8"}
                ]},
                {"server_name": "Thuyết Minh #1", "items": [
                    {"name": "1", "slug": "tap-1", "embed": "https://embed/embed.php?h=3", "m3u8": ""},
                    {"name": "", "slug": "", "embed": "https://embed/embed.php?h=4", "m3u8": ""}
                ]}
            ]
        }
    }"#;

    #[test]
    fn listing_builds_detail_refs_from_slugs() {
        let page = RawPage::new(
            "https://phim.nguonc.com/api/films/phim-moi-cap-nhat?page=1",
            r#"{"items": [{"name": "A", "slug": "a", "thumb_url": "/t/a.jpg", "poster_url": null}]}"#,
        );
        let items = NguonCAdapter.extract_catalog_items(&cfg(), &page).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].detail_ref, "https://phim.nguonc.com/api/film/a");
        assert_eq!(items[0].thumbnail, "/t/a.jpg");
        assert_eq!(items[0].poster, "");
    }

    #[test]
    fn malformed_listing_is_a_shape_fault() {
        let page = RawPage::new("u", r#"{"data": []}"#);
        let err = NguonCAdapter.extract_catalog_items(&cfg(), &page).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[test]
    fn detail_exposes_positional_taxonomy() {
        let page = RawPage::new("https://phim.nguonc.com/api/film/tham-tu", DETAIL);
        let detail = NguonCAdapter.extract_detail(&cfg(), &page).unwrap();
        assert_eq!(detail.title, "Thám Tử Lừng Danh");
        assert_eq!(detail.poster, "https://img/thumb.jpg");
        assert_eq!(detail.cast, vec!["Minami Takayama", "Wakana Yamazaki"]);
        let facets = detail.taxonomy.unwrap();
        assert_eq!(facets[2].facet_name, "Năm");
        assert_eq!(facets[1].entries[1].label, "Hình Sự");
        assert_eq!(detail.status_label, "Hoàn tất (2/2)");
        assert!(detail.episodes_ref.is_none());
    }

    #[test]
    fn rows_rewrite_embed_links_and_keep_server_order() {
        let page = RawPage::new("https://phim.nguonc.com/api/film/tham-tu", DETAIL);
        let rows = NguonCAdapter.extract_episode_rows(&cfg(), &page).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].stream_url, "https://embed/get.php?h=1");
        assert_eq!(rows[0].referer.as_deref(), Some("https://embed/get.php?h=1"));
        assert_eq!(rows[1].stream_url, "https://m/2.m3u8");
        assert_eq!(rows[2].server_label, "Thuyết Minh #1");
        assert_eq!(rows[2].key, "tap-1");
        assert_eq!(rows[2].sort_key, "1");
        assert!(rows[3].episode_name.is_empty());
        assert!(rows.iter().all(|r| r.segmented));
    }

    #[test]
    fn rows_sort_by_episode_name_and_keep_slug_as_key() {
        let page = RawPage::new(
            "https://phim.nguonc.com/api/film/x",
            r#"{"movie": {"name": "X", "slug": "x", "episodes": [{"server_name": "Vietsub", "items": [
                {"name": "10", "slug": "tap-10", "embed": "", "m3u8": "https://m/10.m3u8"},
                {"name": "09", "slug": "tap-9", "embed": "", "m3u8": "https://m/9.m3u8"}
            ]}]}}"#,
        );
        let rows = NguonCAdapter.extract_episode_rows(&cfg(), &page).unwrap();
        let episodes = crate::episodes::aggregate(rows);
        let names: Vec<_> = episodes.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["09", "10"]);
        assert_eq!(episodes[0].key, "tap-9");
    }
}
