//! Page collection: brand shop first, search pages as the fallback

use std::sync::Arc;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::RenderedPage;
use crate::classify::{AppleProductFilter, CategoryClassifier};
use crate::config::ScraperConfig;
use crate::extract::cascade::ExtractionCascade;
use crate::extract::dom::DomExtractor;
use crate::extract::{Extraction, Extractor};
use crate::models::Product;
use crate::store::JsonStore;
use crate::traits::{BrowserSession, PageHandle, WaitUntil};

const SCROLL_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";
const SCROLL_DOWN_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const SCROLL_TOP_SCRIPT: &str = "window.scrollTo(0, 0)";

/// Drives a [`BrowserSession`] over the storefront and collects raw candidates.
pub struct Collector<S: BrowserSession> {
    session: S,
    config: ScraperConfig,
    cascade: ExtractionCascade<RenderedPage>,
    search_extractor: DomExtractor,
    filter: AppleProductFilter,
    store: JsonStore,
}

impl<S: BrowserSession> Collector<S> {
    pub fn new(
        session: S,
        config: ScraperConfig,
        classifier: Arc<CategoryClassifier>,
        filter: AppleProductFilter,
        store: JsonStore,
    ) -> Result<Self> {
        let cascade = ExtractionCascade::standard(&config, Arc::clone(&classifier))?;
        let search_extractor = DomExtractor::new(
            "search-dom",
            config.selectors.search_containers.clone(),
            config.selectors.card.clone(),
            config.base_url.as_str(),
            classifier,
        );

        Ok(Self {
            session,
            config,
            cascade,
            search_extractor,
            filter,
            store,
        })
    }

    /// Brand-shop candidates, or search candidates if the brand shop yields none.
    pub async fn collect(&mut self) -> Vec<Product> {
        let products = self.try_brand_shop().await;
        if !products.is_empty() {
            return products;
        }

        info!("Brand shop yielded no products, falling back to search");
        self.try_search().await
    }

    /// Run the extraction cascade on the brand-shop page.
    pub async fn try_brand_shop(&mut self) -> Vec<Product> {
        let url = self.config.brand_shop_url.clone();
        info!("Trying brand shop: {}", url);

        if let Err(e) = self
            .session
            .navigate(&url, WaitUntil::DomContentLoaded, self.config.navigation_timeout)
            .await
        {
            warn!("Brand shop navigation failed: {:#}", e);
            return Vec::new();
        }

        sleep(self.config.shop_settle_delay).await;
        self.scroll_to_bottom(self.config.shop_max_scrolls).await;

        // Parse in a scope so the DOM is dropped before the next await
        let (products, unmatched_page) = match self.snapshot() {
            Ok(page) => {
                let outcome = self.cascade.run(&page);
                debug!("Cascade states: {:?}", outcome.states);
                match outcome.winner {
                    Some(winner) => {
                        info!("Found {} products via {}", outcome.products.len(), winner);
                        (outcome.products, None)
                    }
                    None => (Vec::new(), Some(page.content())),
                }
            }
            Err(e) => {
                warn!("Brand shop page unavailable: {:#}", e);
                (Vec::new(), None)
            }
        };

        if let Some(content) = unmatched_page {
            match self.store.save_debug_page(&content).await {
                Ok(path) => info!("No products found; page saved to {}", path.display()),
                Err(e) => warn!("Failed to save debug page: {:#}", e),
            }
        }

        products
    }

    /// Search each configured query and keep genuine Apple products.
    pub async fn try_search(&mut self) -> Vec<Product> {
        let mut products = Vec::new();
        let queries = self.config.search_queries.clone();

        for (index, query) in queries.iter().enumerate() {
            if index > 0 {
                sleep(self.config.request_delay).await;
            }

            let url = self.config.search_url(query);
            info!("Searching for: {}", query);

            if let Err(e) = self
                .session
                .navigate(&url, WaitUntil::DomContentLoaded, self.config.navigation_timeout)
                .await
            {
                warn!("Search for '{}' failed: {:#}", query, e);
                continue;
            }

            sleep(self.config.search_settle_delay).await;
            self.scroll_to_bottom(self.config.search_max_scrolls).await;

            let found = match self.snapshot() {
                Ok(page) => self
                    .search_extractor
                    .extract(&page)
                    .map(Extraction::into_products)
                    .unwrap_or_else(|e| {
                        warn!("Search extraction failed for '{}': {:#}", query, e);
                        Vec::new()
                    }),
                Err(e) => {
                    warn!("Search page for '{}' unavailable: {:#}", query, e);
                    continue;
                }
            };

            let genuine: Vec<Product> = found
                .into_iter()
                .filter(|p| self.filter.is_genuine(&p.name))
                .collect();
            info!("Found {} Apple products for '{}'", genuine.len(), query);
            products.extend(genuine);
        }

        products
    }

    /// Scroll until the document stops growing so lazy-loaded cards render.
    /// A session that cannot run scripts simply skips this step.
    async fn scroll_to_bottom(&mut self, max_scrolls: usize) {
        let mut previous_height = None;

        for _ in 0..max_scrolls {
            let height = match self.session.evaluate_script(SCROLL_HEIGHT_SCRIPT).await {
                Ok(value) => value.as_f64(),
                Err(e) => {
                    debug!("Scrolling unavailable: {}", e);
                    return;
                }
            };
            if height == previous_height {
                break;
            }
            previous_height = height;

            if let Err(e) = self.session.evaluate_script(SCROLL_DOWN_SCRIPT).await {
                debug!("Scrolling stopped: {}", e);
                return;
            }
            sleep(self.config.scroll_pause).await;
        }

        if let Err(e) = self.session.evaluate_script(SCROLL_TOP_SCRIPT).await {
            debug!("Could not scroll back to top: {}", e);
        }
    }

    fn snapshot(&self) -> Result<RenderedPage> {
        let content = self.session.page_content()?;
        let url = self.session.current_url().unwrap_or_default().to_string();
        Ok(RenderedPage::parse(content, url))
    }
}
