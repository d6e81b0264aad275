//! HTTP-backed page session and the parsed DOM it exposes to extractors

use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::traits::{BrowserSession, ElementHandle, PageHandle, WaitUntil};

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| anyhow!("Failed to parse selector '{}': {:?}", selector, e))
}

/// A page snapshot parsed into a queryable DOM.
pub struct RenderedPage {
    url: String,
    source: String,
    document: Html,
}

impl RenderedPage {
    pub fn parse(source: impl Into<String>, url: impl Into<String>) -> Self {
        let source = source.into();
        let document = Html::parse_document(&source);
        Self {
            url: url.into(),
            source,
            document,
        }
    }
}

impl PageHandle for RenderedPage {
    type Element<'a> = ElementRef<'a>;

    fn query_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    fn content(&self) -> String {
        self.source.clone()
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl ElementHandle for ElementRef<'_> {
    fn query_one(&self, selector: &str) -> Result<Option<Self>> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).next())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn text_content(&self) -> String {
        ElementRef::text(self).collect()
    }
}

/// A [`BrowserSession`] that fetches pages over plain HTTP.
///
/// There is no script engine behind it, so every wait condition is satisfied
/// once the response body has arrived and `evaluate_script` always fails.
pub struct HttpSession {
    client: Client,
    current: Option<LoadedPage>,
}

struct LoadedPage {
    url: String,
    body: String,
}

impl HttpSession {
    /// Build the HTTP client. Failure here means the session cannot start at all.
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            current: None,
        })
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()> {
        debug!("Navigating to {} (wait: {:?}, timeout: {:?})", url, wait, timeout);

        let response = self.client.get(url).timeout(timeout).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to load page {}: {}",
                url,
                response.status()
            ));
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        info!("Loaded {} ({} bytes)", final_url, body.len());

        self.current = Some(LoadedPage {
            url: final_url,
            body,
        });
        Ok(())
    }

    async fn evaluate_script(&mut self, _script: &str) -> Result<serde_json::Value> {
        Err(anyhow!("Script evaluation is not available over plain HTTP"))
    }

    fn page_content(&self) -> Result<String> {
        self.current
            .as_ref()
            .map(|page| page.body.clone())
            .ok_or_else(|| anyhow!("No page has been loaded"))
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|page| page.url.as_str())
    }
}
