use crate::config::ScraperConfig;
use crate::error::{Result, ToolError};
use crate::scrape::extract;
use scraper::Html;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Field name to the texts its selector matched.
pub type ScrapeResult = BTreeMap<String, Vec<String>>;

pub struct WebScraper {
    base_url: String,
    delay: Duration,
    client: reqwest::Client,
}

impl WebScraper {
    pub fn new(base_url: &str, delay: Duration) -> Result<Self> {
        let config = ScraperConfig::default();
        Self::with_config(base_url, delay, &config)
    }

    pub fn with_config(base_url: &str, delay: Duration, config: &ScraperConfig) -> Result<Self> {
        validate_http_url(base_url).map_err(|message| ToolError::InvalidUrl {
            url: format!("{} ({})", base_url, message),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ToolError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            delay,
            client,
        })
    }

    /// GET and parse a page; `None` on network errors or non-2xx status.
    ///
    /// Every successful fetch is followed by the configured delay.
    pub async fn fetch_page(&self, url: &str) -> Option<Html> {
        match self.fetch_body(url).await {
            Ok(body) => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                Some(Html::parse_document(&body))
            }
            Err(e) => {
                log::error!("Error fetching {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch_body(&self, url: &str) -> reqwest::Result<String> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }

    pub fn extract_links(&self, document: &Html) -> Vec<String> {
        extract::extract_links(document, &self.base_url)
    }

    pub fn extract_text(&self, document: &Html, selector: &str) -> Result<Vec<String>> {
        extract::extract_text(document, selector)
    }

    /// Fetch `url` once and run every named selector against it.
    ///
    /// `Ok(None)` means the page could not be fetched; a page where nothing
    /// matched yields empty lists.
    pub async fn extract_data(
        &self,
        url: &str,
        selectors: &BTreeMap<String, String>,
    ) -> Result<Option<ScrapeResult>> {
        let Some(document) = self.fetch_page(url).await else {
            return Ok(None);
        };

        self.extract_fields(&document, selectors).map(Some)
    }

    pub fn extract_fields(
        &self,
        document: &Html,
        selectors: &BTreeMap<String, String>,
    ) -> Result<ScrapeResult> {
        let mut data = ScrapeResult::new();
        for (field, selector) in selectors {
            data.insert(field.clone(), self.extract_text(document, selector)?);
        }
        Ok(data)
    }
}

/// Write `data` as pretty-printed UTF-8 JSON, replacing `path` atomically.
pub fn save_to_json<T: serde::Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(data)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|e| ToolError::Io(e.error))?;

    log::info!("Data saved to {}", path.display());
    Ok(())
}

pub fn validate_http_url(s: &str) -> std::result::Result<String, String> {
    let url = Url::parse(s)
        .map_err(|_| "Invalid URL format. Please provide a valid URL.".to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err("Only http and https URLs are supported".to_string()),
    }

    if url.host_str().is_none_or(|h| h.is_empty()) {
        return Err("URL must include a valid hostname".to_string());
    }

    Ok(s.to_string())
}
