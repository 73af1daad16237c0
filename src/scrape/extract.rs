use crate::error::{Result, ToolError};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Resolve every `a[href]` against `base_url`.
///
/// Absolute http(s) links are kept, root-relative links get the base URL
/// prepended, everything else (fragments, `mailto:`, relative paths) is
/// dropped.
pub fn extract_links(document: &Html, base_url: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| {
            let href = href.trim();
            let lower = href.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                Some(href.to_string())
            } else if href.starts_with('/') {
                Some(format!("{}{}", base, href))
            } else {
                None
            }
        })
        .collect()
}

/// Trimmed text of each element matching `selector`, in document order.
pub fn extract_text(document: &Html, selector: &str) -> Result<Vec<String>> {
    let parsed = Selector::parse(selector).map_err(|_| ToolError::InvalidSelector {
        selector: selector.to_string(),
    })?;

    Ok(document
        .select(&parsed)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect())
}
