//! HTML site whose detail page links to a separate watch page. The watch page
//! lists episodes by `pm<id>` URLs, and each id is turned into streams by
//! POSTing to the site's player endpoint once per player server.

use std::sync::LazyLock;

use provider_interface::raw::{EpisodeRow, RawCatalogItem, RawDetail, RawPage};
use provider_interface::ExtractError;
use regex::Regex;
use scraper::Html;

use super::html::{anchor_texts, css_url, selector, text_of, year_in};
use crate::config::ProviderConfig;
use crate::fetch::FetchRequest;
use crate::normalize::normalize;
use crate::provider::ProviderAdapter;
use crate::types::StreamSource;

static PM_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"pm(\d+)$").unwrap());

const PLAYER_PATH: &str = "/chillsplayer.php";
const PLAYER_SERVERS: [&str; 2] = ["0", "1"];
const SERVER_LABEL: &str = "PhimMoiChill";

const FAST_PLAYER: &str = "player/sotrym.js";
const HLS_PLAYER: &str = "player/dashstrim.js";

#[derive(Debug, Clone, Copy, Default)]
pub struct PhimMoiChillAdapter;

fn pm_id(url: &str) -> Option<&str> {
    PM_ID.captures(url.trim_end_matches('/')).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Argument of `iniPlayers("...", ...)` in a player response.
fn player_id(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("iniPlayers(\"")?;
    let (id, _) = rest.split_once("\",")?;
    Some(id).filter(|id| !id.is_empty())
}

impl ProviderAdapter for PhimMoiChillAdapter {
    fn key(&self) -> &'static str { "phimmoichill" }

    fn extract_catalog_items(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<RawCatalogItem>, ExtractError> {
        let document = Html::parse_document(&page.text);
        let item_sel = selector(".list-film .item")?;
        let a_sel = selector("a")?;
        let title_sel = selector("a h3")?;
        let img_sel = selector("a img")?;

        let mut items = Vec::new();
        for entry in document.select(&item_sel) {
            let href = entry
                .select(&a_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| ExtractError::missing("catalog entry href"))?;
            let image = entry
                .select(&img_sel)
                .next()
                .and_then(|img| img.value().attr("src"))
                .unwrap_or_default()
                .to_string();
            items.push(RawCatalogItem {
                title: entry.select(&title_sel).next().map(text_of).unwrap_or_default(),
                detail_ref: href.to_string(),
                poster: image.clone(),
                thumbnail: image,
            });
        }
        Ok(items)
    }

    fn extract_detail(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<RawDetail, ExtractError> {
        let document = Html::parse_document(&page.text);
        let title_sel = selector(".film-info h1[itemprop=name]")?;
        let content_sel = selector(".film-content #film-content")?;
        let image_sel = selector(".film-info .image")?;
        let year_sel = selector(".film-info h2")?;
        let meta_sel = selector(".entry-meta li")?;
        let label_sel = selector("label")?;
        let latest_sel = selector(".latest-episode")?;
        let watch_sel = selector(".list-button .btn.btn-see")?;
        let a_sel = selector("a")?;

        let title = document
            .select(&title_sel)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::missing("detail title"))?;

        let mut detail = RawDetail {
            title,
            synopsis: document.select(&content_sel).next().map(text_of).unwrap_or_default(),
            poster: document
                .select(&image_sel)
                .next()
                .and_then(|el| el.value().attr("style"))
                .and_then(css_url)
                .unwrap_or_default(),
            publish_year: document.select(&year_sel).next().and_then(|h2| year_in(&text_of(h2))),
            status_label: document.select(&latest_sel).next().map(text_of).unwrap_or_default(),
            episodes_ref: document
                .select(&watch_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
            ..RawDetail::default()
        };

        for line in document.select(&meta_sel) {
            let label = line.select(&label_sel).next().map(text_of).unwrap_or_default();
            let lowered = label.to_lowercase();
            if lowered.contains("diễn viên") {
                detail.cast = anchor_texts(line, &a_sel);
            } else if lowered.contains("thể loại") {
                detail.tags = anchor_texts(line, &a_sel);
            } else if lowered.contains("thời lượng") {
                detail.duration_label = text_of(line).replacen(&label, "", 1).trim().to_string();
            }
        }
        Ok(detail)
    }

    /// Rows of the watch page. A movie's watch page has no episode list; its
    /// own `pm<id>` URL becomes a single "Full" row.
    fn extract_episode_rows(&self, cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<EpisodeRow>, ExtractError> {
        let document = Html::parse_document(&page.text);
        let episode_sel = selector(".episodes a")?;

        let mut rows = Vec::new();
        for anchor in document.select(&episode_sel) {
            let href = normalize(anchor.value().attr("href").unwrap_or_default().trim(), &cfg.base_url);
            let Some(id) = pm_id(&href).or_else(|| anchor.value().attr("data-id")) else {
                continue;
            };
            rows.push(EpisodeRow::new(text_of(anchor), id, SERVER_LABEL, href.as_str(), true));
        }
        if rows.is_empty() {
            if let Some(id) = pm_id(&page.url) {
                rows.push(EpisodeRow::new("Full", id, SERVER_LABEL, page.url.as_str(), true));
            }
        }
        Ok(rows)
    }

    fn stream_requests(&self, cfg: &ProviderConfig, source: &StreamSource) -> Vec<FetchRequest> {
        let Some(id) = pm_id(&source.stream_url) else {
            return Vec::new();
        };
        let player = format!("{}{PLAYER_PATH}", cfg.base_url);
        PLAYER_SERVERS
            .iter()
            .map(|sv| {
                cfg.form_request(player.as_str(), [("qcao", id), ("sv", *sv)])
                    .header("Referer", source.stream_url.as_str())
            })
            .collect()
    }

    fn extract_streams(
        &self,
        cfg: &ProviderConfig,
        _source: &StreamSource,
        index: usize,
        page: &RawPage,
    ) -> Result<Vec<EpisodeRow>, ExtractError> {
        let (kind, stream_url) = if page.text.contains(FAST_PLAYER) {
            let id = player_id(&page.text).ok_or_else(|| ExtractError::missing("player id"))?;
            ("PMFAST", format!("https://dash.motchills.net/raw/{id}/index.m3u8"))
        } else if page.text.contains(HLS_PLAYER) {
            let id = player_id(&page.text).ok_or_else(|| ExtractError::missing("player id"))?;
            let direct = format!("https://sotrim.topphimmoi.org/hlspm/{id}");
            let url = match cfg.stream_proxy.as_deref() {
                Some(proxy) => {
                    let encoded: String = url::form_urlencoded::byte_serialize(direct.as_bytes()).collect();
                    format!("{}/api/phimmoichill/proxy?url={encoded}", proxy.trim_end_matches('/'))
                }
                None => direct,
            };
            ("PMHLS", url)
        } else {
            return Ok(Vec::new());
        };
        let label = format!("#{} {kind}", index + 1);
        let referer = format!("{}/", cfg.base_url);
        Ok(vec![EpisodeRow::new(label.as_str(), "", label.as_str(), stream_url, true).with_referer(referer)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Method;
    use crate::types::Quality;

    fn cfg() -> ProviderConfig {
        ProviderConfig::from_toml_str(
            r#"
            name = "phimmoichill"
            adapter = "phimmoichill"
            base_url = "https://pmc.test"
            search_path = "/tim-kiem/{query}"
            pagination = "path"
            stream_proxy = "https://proxy.test/"
            "#,
        )
        .unwrap()
    }

    const LISTING: &str = r#"
        <ul class="list-film">
          <li class="item"><a href="https://pmc.test/info/ong-trum-pm1"><img src="/img/a.jpg"><h3> Ông Trùm </h3></a></li>
          <li class="item"><a href="/info/thay-boi-pm2"><img src="https://cdn/b.jpg"><h3>Thầy Bói</h3></a></li>
        </ul>"#;

    const DETAIL: &str = r#"
        <div class="film-info">
          <div class="image" style="background-image: url('/img/poster.jpg')"></div>
          <h1 itemprop="name">Thầy Bói Xem Voi</h1>
          <h2>Fortune Teller (2021)</h2>
          <ul class="entry-meta">
            <li><label>Thể loại:</label> <a href="/g/1">Hài</a>, <a href="/g/2">Tâm Lý</a></li>
            <li><label>Diễn viên:</label> <a href="/a/1">Lee Seung-gi</a></li>
            <li><label>Thời lượng:</label> 16 Tập</li>
          </ul>
          <div class="list-button"><a class="btn btn-see" href="https://pmc.test/xem/thay-boi-tap-1-pm200">Xem phim</a></div>
        </div>
        <div class="film-content"><div id="film-content"> Một thầy bói. </div></div>"#;

    const WATCH: &str = r#"
        <ul class="episodes">
          <li><a href="/xem/thay-boi-tap-2-pm201">2</a></li>
          <li><a href="https://pmc.test/xem/thay-boi-tap-1-pm200">1</a></li>
          <li><a href="/xem/trailer">Trailer</a></li>
        </ul>"#;

    #[test]
    fn listing_reads_item_cards() {
        let items = PhimMoiChillAdapter
            .extract_catalog_items(&cfg(), &RawPage::new("https://pmc.test/list/phim-le/page-1", LISTING))
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Ông Trùm");
        assert_eq!(items[0].detail_ref, "https://pmc.test/info/ong-trum-pm1");
        assert_eq!(items[0].thumbnail, "/img/a.jpg");
        assert_eq!(items[1].poster, "https://cdn/b.jpg");
    }

    #[test]
    fn detail_reads_meta_lines_and_watch_link() {
        let detail = PhimMoiChillAdapter
            .extract_detail(&cfg(), &RawPage::new("https://pmc.test/info/thay-boi-pm2", DETAIL))
            .unwrap();
        assert_eq!(detail.title, "Thầy Bói Xem Voi");
        assert_eq!(detail.synopsis, "Một thầy bói.");
        assert_eq!(detail.poster, "/img/poster.jpg");
        assert_eq!(detail.publish_year, Some(2021));
        assert_eq!(detail.tags, vec!["Hài", "Tâm Lý"]);
        assert_eq!(detail.cast, vec!["Lee Seung-gi"]);
        assert_eq!(detail.duration_label, "16 Tập");
        assert_eq!(detail.episodes_ref.as_deref(), Some("https://pmc.test/xem/thay-boi-tap-1-pm200"));
    }

    #[test]
    fn detail_without_title_is_a_shape_fault() {
        let err = PhimMoiChillAdapter.extract_detail(&cfg(), &RawPage::new("u", "<p>404</p>")).unwrap_err();
        assert_eq!(err, ExtractError::missing("detail title"));
    }

    #[test]
    fn watch_page_rows_are_keyed_by_player_id() {
        let page = RawPage::new("https://pmc.test/xem/thay-boi-tap-1-pm200", WATCH);
        let rows = PhimMoiChillAdapter.extract_episode_rows(&cfg(), &page).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.episode_name.as_str(), r.key.as_str())).collect();
        assert_eq!(keys, vec![("2", "201"), ("1", "200")]);
        assert_eq!(rows[0].stream_url, "https://pmc.test/xem/thay-boi-tap-2-pm201");
    }

    #[test]
    fn movie_watch_page_is_one_full_row() {
        let page = RawPage::new("https://pmc.test/xem/ong-trum-pm77", "<div class=\"player\"></div>");
        let rows = PhimMoiChillAdapter.extract_episode_rows(&cfg(), &page).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].episode_name, "Full");
        assert_eq!(rows[0].key, "77");
    }

    fn source(url: &str) -> StreamSource {
        StreamSource {
            server_label: SERVER_LABEL.into(),
            stream_url: url.into(),
            is_segmented: true,
            referer: String::new(),
            quality: Quality::Unknown,
        }
    }

    #[test]
    fn player_requests_post_once_per_server() {
        let requests = PhimMoiChillAdapter.stream_requests(&cfg(), &source("https://pmc.test/xem/ong-trum-pm77"));
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://pmc.test/chillsplayer.php");
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[1].body.as_deref(), Some("qcao=77&sv=1"));
        assert!(requests[0]
            .headers
            .contains(&("Referer".to_string(), "https://pmc.test/xem/ong-trum-pm77".to_string())));

        assert!(PhimMoiChillAdapter.stream_requests(&cfg(), &source("https://pmc.test/xem/trailer")).is_empty());
    }

    #[test]
    fn player_responses_map_to_streams() {
        let src = source("https://pmc.test/xem/ong-trum-pm77");
        let fast = RawPage::new("p", r#"<script src="/player/sotrym.js"></script><script>iniPlayers("abc123", 0);</script>"#);
        let rows = PhimMoiChillAdapter.extract_streams(&cfg(), &src, 0, &fast).unwrap();
        assert_eq!(rows[0].server_label, "#1 PMFAST");
        assert_eq!(rows[0].stream_url, "https://dash.motchills.net/raw/abc123/index.m3u8");
        assert_eq!(rows[0].referer.as_deref(), Some("https://pmc.test/"));

        let hls = RawPage::new("p", r#"<script src="/player/dashstrim.js"></script>iniPlayers("x9", 1)"#);
        let rows = PhimMoiChillAdapter.extract_streams(&cfg(), &src, 1, &hls).unwrap();
        assert_eq!(rows[0].server_label, "#2 PMHLS");
        assert_eq!(
            rows[0].stream_url,
            "https://proxy.test/api/phimmoichill/proxy?url=https%3A%2F%2Fsotrim.topphimmoi.org%2Fhlspm%2Fx9"
        );

        let unknown = RawPage::new("p", "<html>maintenance</html>");
        assert!(PhimMoiChillAdapter.extract_streams(&cfg(), &src, 0, &unknown).unwrap().is_empty());
    }
}
