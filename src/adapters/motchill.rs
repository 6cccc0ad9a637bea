//! HTML site built on the "myui" theme: `.myui-vodlist__box` listings and a
//! detail page whose metadata lives in labelled `<h6>` lines.

use provider_interface::raw::{EpisodeRow, RawCatalogItem, RawDetail, RawPage};
use provider_interface::utils::first_non_empty;
use provider_interface::ExtractError;
use scraper::Html;

use super::html::{anchor_texts, css_url, selector, text_of, year_in};
use crate::config::ProviderConfig;
use crate::provider::ProviderAdapter;

const GENRE_LABEL: &str = "Thể loại:";
const STATUS_LABEL: &str = "Trạng thái:";
const CAST_LABEL: &str = "Diễn viên:";
const DURATION_LABEL: &str = "Thời lượng:";

#[derive(Debug, Clone, Copy, Default)]
pub struct MotChillAdapter;

/// Text after `label` on a meta line, e.g. "Trạng thái: Full" -> "Full".
fn after_label(line: &str, label: &str) -> String {
    line.split_once(label)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

impl ProviderAdapter for MotChillAdapter {
    fn key(&self) -> &'static str { "motchill" }

    fn extract_catalog_items(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<Vec<RawCatalogItem>, ExtractError> {
        let document = Html::parse_document(&page.text);
        let box_sel = selector(".myui-vodlist__box")?;
        let title_sel = selector(".myui-vodlist__detail .title a")?;
        let thumb_sel = selector("a.myui-vodlist__thumb, a")?;

        let mut items = Vec::new();
        for entry in document.select(&box_sel) {
            let link = entry
                .select(&title_sel)
                .next()
                .ok_or_else(|| ExtractError::missing("catalog entry title link"))?;
            let href = link.value().attr("href").unwrap_or_default().trim();
            if href.is_empty() {
                return Err(ExtractError::missing("catalog entry href"));
            }
            let thumbnail = entry
                .select(&thumb_sel)
                .find_map(|a| {
                    let style = a.value().attr("style").and_then(css_url);
                    style.or_else(|| a.value().attr("data-original").map(str::to_string))
                })
                .unwrap_or_default();
            items.push(RawCatalogItem {
                title: text_of(link),
                detail_ref: href.to_string(),
                poster: thumbnail.clone(),
                thumbnail,
            });
        }
        Ok(items)
    }

    fn extract_detail(&self, _cfg: &ProviderConfig, page: &RawPage) -> Result<RawDetail, ExtractError> {
        let document = Html::parse_document(&page.text);
        let title_sel = selector(".myui-content__detail .title")?;
        let desc_sel = selector(r#".myui-movie-detail div[itemprop="description"]"#)?;
        let thumb_sel = selector(".myui-content__thumb img")?;
        let meta_sel = selector(".myui-content__detail .myui-media-info h6")?;
        let a_sel = selector("a")?;

        let title = document
            .select(&title_sel)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::missing("detail title"))?;
        let synopsis = document.select(&desc_sel).next().map(text_of).unwrap_or_default();
        let poster = document
            .select(&thumb_sel)
            .next()
            .and_then(|img| {
                let v = img.value();
                first_non_empty(&[
                    v.attr("data-original").unwrap_or_default(),
                    v.attr("src").unwrap_or_default(),
                ])
                .map(str::to_string)
            })
            .unwrap_or_default();

        let mut detail = RawDetail { title, synopsis, poster, ..RawDetail::default() };
        for (index, line) in document.select(&meta_sel).enumerate() {
            let text = text_of(line);
            if index == 0 {
                detail.publish_year = year_in(&text);
            }
            if text.contains(GENRE_LABEL) {
                detail.tags = anchor_texts(line, &a_sel);
            }
            if text.contains(STATUS_LABEL) {
                detail.status_label = after_label(&text, STATUS_LABEL);
            }
            if text.contains(CAST_LABEL) {
                detail.cast = anchor_texts(line, &a_sel);
            }
            if text.contains(DURATION_LABEL) {
                detail.duration_label = after_label(&text, DURATION_LABEL);
            }
        }
        Ok(detail)
    }

    /// Playable links sit behind a separate player flow this site does not
    /// expose in its HTML, so the detail page yields no rows.
    fn extract_episode_rows(&self, _cfg: &ProviderConfig, _page: &RawPage) -> Result<Vec<EpisodeRow>, ExtractError> {
        Ok(Vec::new())
    }
}
