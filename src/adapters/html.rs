use std::sync::LazyLock;

use provider_interface::ExtractError;
use regex::Regex;
use scraper::{ElementRef, Selector};

static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d{4})\)").unwrap());
static CSS_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?(.*?)['"]?\s*\)"#).unwrap());

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::malformed(format!("selector `{css}`"), e))
}

/// Element text with whitespace runs collapsed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn anchor_texts(el: ElementRef<'_>, a: &Selector) -> Vec<String> {
    el.select(a).map(text_of).filter(|t| !t.is_empty()).collect()
}

/// First `url(...)` of an inline style.
pub(crate) fn css_url(style: &str) -> Option<String> {
    CSS_URL_PATTERN
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// `(2002)` style year anywhere in `text`.
pub(crate) fn year_in(text: &str) -> Option<u32> {
    YEAR_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
