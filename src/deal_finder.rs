use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::browser::HttpSession;
use crate::classify::{AppleProductFilter, CategoryClassifier};
use crate::collector::Collector;
use crate::config::ScraperConfig;
use crate::models::{Product, ResultSet};
use crate::pipeline;
use crate::store::JsonStore;
use crate::traits::BrowserSession;

const TOP_DEALS: usize = 10;
const SUMMARY_NAME_CHARS: usize = 45;

pub struct DealFinder<S: BrowserSession> {
    collector: Collector<S>,
    filter: AppleProductFilter,
    store: JsonStore,
    source_url: String,
}

impl DealFinder<HttpSession> {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let session = HttpSession::new(&config.user_agent)?;
        Self::with_session(session, config)
    }
}

impl<S: BrowserSession> DealFinder<S> {
    pub fn with_session(session: S, config: ScraperConfig) -> Result<Self> {
        let classifier = Arc::new(CategoryClassifier::default());
        let filter = AppleProductFilter::default();
        let store = JsonStore::new(&config.data_dir, config.output_file());
        let source_url = config.brand_shop_url.clone();
        let collector = Collector::new(session, config, classifier, filter.clone(), store.clone())?;

        Ok(Self {
            collector,
            filter,
            store,
            source_url,
        })
    }

    pub async fn check_for_deals(&mut self) -> Result<ResultSet> {
        let candidates = self.collector.collect().await;
        let ranked = pipeline::finalize(candidates, &self.filter);
        let result = ResultSet::assemble(ranked, self.source_url.as_str());

        self.store.save(&result).await?;
        log_summary(&result);

        Ok(result)
    }
}

fn log_summary(result: &ResultSet) {
    if result.products.is_empty() {
        warn!("No products collected; the storefront may be blocking automated access");
        return;
    }

    let deals: Vec<&Product> = result
        .products
        .iter()
        .filter(|p| p.discount_percent > 0.0)
        .collect();
    info!(
        "Collected {} products, {} of them discounted",
        result.total_products,
        deals.len()
    );

    for (rank, p) in deals.iter().take(TOP_DEALS).enumerate() {
        let name: String = p.name.chars().take(SUMMARY_NAME_CHARS).collect();
        info!(
            "{:2}. {} | {}원 -> {}원 ({}% off)",
            rank + 1,
            name,
            p.original_price,
            p.price,
            p.discount_percent
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::browser::fake::FakeSession;

    #[tokio::test]
    async fn test_check_for_deals_end_to_end() {
        let data_dir = std::env::temp_dir().join(format!("apple-deal-tracker-finder-{}", std::process::id()));
        let config = ScraperConfig {
            data_dir: data_dir.clone(),
            shop_settle_delay: Duration::ZERO,
            scroll_pause: Duration::ZERO,
            ..ScraperConfig::default()
        };

        let shop_page = r#"<html><body>
            <div class="product-card"><a href="/vp/products/1"></a>
                <div class="name">iPhone 15</div><span class="origin-price">1,200,000원</span><span class="price-value">1,000,000원</span></div>
            <div class="product-card"><a href="/vp/products/2"></a>
                <div class="name">iphone 15 </div><span class="origin-price">1,200,000원</span><span class="price-value">1,000,000원</span></div>
            <div class="product-card"><a href="/vp/products/3"></a>
                <div class="name">AirPods 4</div><span class="price-value">199,000원</span></div>
            <div class="product-card"><a href="/vp/products/4"></a>
                <div class="name">iPhone 15 compatible case</div><del>30,000</del><span class="price-value">9,900원</span></div>
        </body></html>"#;
        let session = FakeSession::default().with_page(&config.brand_shop_url, shop_page);

        let mut finder = DealFinder::with_session(session, config).unwrap();
        let result = finder.check_for_deals().await.unwrap();

        assert_eq!(result.total_products, 2);
        assert_eq!(result.source_url, "https://shop.coupang.com/apple/76487");
        let top = &result.products[0];
        assert_eq!(top.name, "iPhone 15");
        assert_eq!(top.discount_percent, 16.7);
        assert_eq!(top.savings, 200_000);
        assert_eq!(top.url, "https://www.coupang.com/vp/products/1");
        assert_eq!(result.products[1].discount_percent, 0.0);

        let saved = tokio::fs::read_to_string(data_dir.join("products.json")).await.unwrap();
        assert!(saved.contains("\"discountPercent\": 16.7"));

        tokio::fs::remove_dir_all(&data_dir).await.unwrap();
    }
}
