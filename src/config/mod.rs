//! Scraper configuration: target site, selector tables and timing
//!
//! Everything site-specific lives here as plain data. Selector lists and
//! state markers are heuristics for the current storefront markup and are
//! expected to be edited when the site changes.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::extract::embedded::DEFAULT_STATE_MARKERS;

/// Configuration for the storefront being monitored
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root used to resolve root-relative links
    pub base_url: String,
    /// Brand-shop landing page, tried first
    pub brand_shop_url: String,
    /// Search URL pattern with {query} placeholder
    pub search_url_pattern: String,
    /// Queries used when the brand shop yields nothing
    pub search_queries: Vec<String>,
    /// CSS selectors for product cards
    pub selectors: SiteSelectors,
    /// Regex patterns locating embedded state objects, in priority order
    pub state_markers: Vec<String>,
    /// User agent sent with every navigation
    pub user_agent: String,
    /// Directory for the result artifact and debug dumps
    pub data_dir: PathBuf,
    /// Upper bound for a single navigation
    pub navigation_timeout: Duration,
    /// Wait after the brand-shop page loads, before scrolling
    pub shop_settle_delay: Duration,
    /// Wait after a search page loads, before scrolling
    pub search_settle_delay: Duration,
    /// Pause between scroll rounds
    pub scroll_pause: Duration,
    /// Scroll rounds on the brand-shop page
    pub shop_max_scrolls: usize,
    /// Scroll rounds on a search page
    pub search_max_scrolls: usize,
    /// Pause between consecutive search queries
    pub request_delay: Duration,
}

/// CSS selectors for the two kinds of product listing pages
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Card containers on the brand-shop page, in priority order
    pub shop_containers: Vec<String>,
    /// Card containers on search result pages, in priority order
    pub search_containers: Vec<String>,
    /// Field selectors within a card
    pub card: CardSelectors,
}

/// CSS selectors for the fields of a single product card
#[derive(Debug, Clone)]
pub struct CardSelectors {
    /// Name candidates; a `title` attribute beats element text
    pub name: Vec<String>,
    /// Image whose alt text names the product when nothing else does
    pub name_fallback_image: String,
    /// Current price candidates, first non-zero wins
    pub price: Vec<String>,
    /// Strikethrough/base price candidates, first non-zero wins
    pub original_price: Vec<String>,
    /// Product link
    pub link: String,
    /// Product image
    pub image: String,
    /// Image source attributes, including lazy-load variants
    pub image_attributes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            shop_containers: strings(&[
                ".product-card",
                ".product-item",
                "[class*='ProductCard']",
                "[class*='product-card']",
                "li.baby-product",
                ".baby-product-wrap",
                "[class*='ProductItem']",
                "a[data-product-id]",
                "[data-item-id]",
            ]),
            search_containers: strings(&["li.search-product", "li.baby-product", ".search-product"]),
            card: CardSelectors {
                name: strings(&[".name", ".product-name", ".title", "a[title]"]),
                name_fallback_image: "img[alt]".to_string(),
                price: strings(&[
                    ".price-value",
                    ".sale-price",
                    "strong.price-value",
                    "[class*='price']",
                ]),
                original_price: strings(&[".origin-price", ".base-price", "del", "s"]),
                link: "a[href]".to_string(),
                image: "img".to_string(),
                image_attributes: strings(&["src", "data-img-src", "data-src"]),
            },
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.coupang.com".to_string(),
            brand_shop_url: "https://shop.coupang.com/apple/76487".to_string(),
            search_url_pattern: "https://www.coupang.com/np/search?component=&q={query}&channel=user"
                .to_string(),
            search_queries: strings(&[
                "Apple 아이폰",
                "Apple 아이패드",
                "Apple 맥북",
                "Apple 에어팟",
                "Apple 워치",
                "Apple Mac",
            ]),
            selectors: SiteSelectors::default(),
            state_markers: strings(DEFAULT_STATE_MARKERS),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
            data_dir: PathBuf::from("data"),
            navigation_timeout: Duration::from_millis(30_000),
            shop_settle_delay: Duration::from_millis(3_000),
            search_settle_delay: Duration::from_millis(2_000),
            scroll_pause: Duration::from_millis(1_500),
            shop_max_scrolls: 15,
            search_max_scrolls: 5,
            request_delay: Duration::from_millis(2_000),
        }
    }
}

impl ScraperConfig {
    /// Defaults with overrides from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("BRAND_SHOP_URL") {
            config.brand_shop_url = url;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        let millis = |key: &str| -> Result<Option<Duration>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .with_context(|| format!("{key} must be a number of milliseconds, got '{raw}'"))
                })
                .transpose()
        };

        if let Some(timeout) = millis("NAVIGATION_TIMEOUT_MS")? {
            config.navigation_timeout = timeout;
        }
        if let Some(delay) = millis("REQUEST_DELAY_MS")? {
            config.request_delay = delay;
        }
        if let Some(pause) = millis("SCROLL_PAUSE_MS")? {
            config.scroll_pause = pause;
        }

        Ok(config)
    }

    /// Build the search URL for a query.
    ///
    /// # Arguments
    /// * `query` - The term to search for
    ///
    /// # Returns
    /// * `String` - The complete search URL
    pub fn search_url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        self.search_url_pattern.replace("{query}", &encoded)
    }

    /// Where the result artifact is written.
    pub fn output_file(&self) -> PathBuf {
        self.data_dir.join("products.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_search_url_is_encoded() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.search_url("Apple 맥북"),
            "https://www.coupang.com/np/search?component=&q=Apple%20%EB%A7%A5%EB%B6%81&channel=user"
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = ScraperConfig::from_lookup(lookup(&[
            ("BRAND_SHOP_URL", "https://shop.example.com/apple"),
            ("DATA_DIR", "/tmp/deals"),
            ("NAVIGATION_TIMEOUT_MS", "5000"),
            ("REQUEST_DELAY_MS", " 0 "),
        ]))
        .unwrap();
        assert_eq!(config.brand_shop_url, "https://shop.example.com/apple");
        assert_eq!(config.output_file(), PathBuf::from("/tmp/deals/products.json"));
        assert_eq!(config.navigation_timeout, Duration::from_secs(5));
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.scroll_pause, Duration::from_millis(1_500));
    }

    #[test]
    fn test_invalid_numeric_override() {
        let err = ScraperConfig::from_lookup(lookup(&[("NAVIGATION_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("NAVIGATION_TIMEOUT_MS"));
    }

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.output_file(), PathBuf::from("data/products.json"));
        assert_eq!(config.state_markers.len(), 3);
        assert_eq!(config.selectors.search_containers[0], "li.search-product");
    }
}
