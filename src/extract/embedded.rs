//! Embedded application-state extraction
//!
//! Storefronts often hydrate their client with a JSON blob assigned to a
//! global in an inline script (`window.__NEXT_DATA__ = {...}`). This strategy
//! locates such an assignment, parses the blob, and searches the resulting
//! tree for objects shaped like products.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use tracing::debug;

use super::{Extraction, Extractor, absolutize, first_present, first_success, scalar_text};
use crate::classify::CategoryClassifier;
use crate::models::Product;
use crate::price::parse_price;
use crate::traits::{ElementHandle, PageHandle};

const INLINE_SCRIPT_SELECTOR: &str = "script:not([src])";

/// Deepest nesting level the product search descends to.
pub const MAX_SEARCH_DEPTH: usize = 10;

const NAME_KEYS: &[&str] = &["productName", "name", "title", "itemName"];
const SALE_PRICE_KEYS: &[&str] = &["salePrice", "salesPrice", "finalPrice", "price"];
const LIST_PRICE_KEYS: &[&str] = &["listPrice", "originalPrice", "basePrice", "price"];
const URL_KEYS: &[&str] = &["productUrl", "url", "landingUrl"];
const IMAGE_KEYS: &[&str] = &["productImage", "imageUrl", "thumbnail"];

/// Default state markers, tried in order.
pub const DEFAULT_STATE_MARKERS: &[&str] = &[
    r"window\.__NEXT_DATA__\s*=\s*",
    r"window\.__INITIAL_STATE__\s*=\s*",
    r"__data\s*=\s*",
];

pub struct EmbeddedStateExtractor {
    markers: Vec<Regex>,
    base_url: String,
    classifier: Arc<CategoryClassifier>,
}

impl EmbeddedStateExtractor {
    /// # Arguments
    /// * `markers` - Regex patterns matching the text right before a state
    ///   object, in priority order
    /// * `base_url` - Site root used to resolve root-relative product links
    pub fn new(
        markers: &[impl AsRef<str>],
        base_url: impl Into<String>,
        classifier: Arc<CategoryClassifier>,
    ) -> Result<Self> {
        let markers = markers
            .iter()
            .map(|m| {
                Regex::new(m.as_ref())
                    .map_err(|e| anyhow!("Failed to compile state marker '{}': {}", m.as_ref(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            markers,
            base_url: base_url.into(),
            classifier,
        })
    }

    /// Products found in one inline script, or none if it carries no
    /// recognizable state object.
    pub fn extract_from_script(&self, script: &str) -> Vec<Product> {
        let lower = script.to_lowercase();
        if !(lower.contains("product") && lower.contains("price")) {
            return Vec::new();
        }

        let Some(state) = first_success(&self.markers, |marker| state_after_marker(marker, script))
        else {
            return Vec::new();
        };

        let mut products = Vec::new();
        self.search(&state, 0, &mut products);
        products
    }

    /// Depth-bounded search for product-shaped objects. A product-shaped
    /// object is a leaf: its children are never searched.
    pub fn search(&self, value: &Value, depth: usize, products: &mut Vec<Product>) {
        if depth > MAX_SEARCH_DEPTH {
            return;
        }

        match value {
            Value::Object(object) if looks_like_product(object) => {
                if let Some(product) = self.product_from(object) {
                    products.push(product);
                }
            }
            Value::Object(object) => {
                for child in object.values() {
                    self.search(child, depth + 1, products);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.search(item, depth + 1, products);
                }
            }
            _ => {}
        }
    }

    fn product_from(&self, object: &Map<String, Value>) -> Option<Product> {
        let name = first_present(object, NAME_KEYS).and_then(scalar_text)?;
        let price = first_present(object, SALE_PRICE_KEYS).map_or(0, state_amount);
        if name.is_empty() || price == 0 {
            return None;
        }

        let original_price = first_present(object, LIST_PRICE_KEYS).map_or(0, state_amount);
        let url = first_present(object, URL_KEYS)
            .and_then(scalar_text)
            .map(|u| absolutize(&self.base_url, &u))
            .unwrap_or_default();
        let image = first_present(object, IMAGE_KEYS)
            .and_then(scalar_text)
            .unwrap_or_default();
        let category = self.classifier.classify(&name);

        Some(Product::new(name, price, original_price, url, image, category))
    }
}

impl<P: PageHandle> Extractor<P> for EmbeddedStateExtractor {
    fn name(&self) -> &'static str {
        "embedded-state"
    }

    fn extract(&self, page: &P) -> Result<Extraction> {
        let mut products = Vec::new();
        for script in page.query_all(INLINE_SCRIPT_SELECTOR)? {
            products.extend(self.extract_from_script(&script.text_content()));
        }
        Ok(products.into())
    }
}

fn looks_like_product(object: &Map<String, Value>) -> bool {
    NAME_KEYS.iter().any(|k| object.contains_key(*k))
        && SALE_PRICE_KEYS.iter().any(|k| object.contains_key(*k))
}

/// Parse the JSON object that starts right after `marker`'s match.
fn state_after_marker(marker: &Regex, script: &str) -> Option<Value> {
    let found = marker.find(script)?;
    let rest = script[found.end()..].trim_start();
    if !rest.starts_with('{') {
        return None;
    }

    match Deserializer::from_str(rest).into_iter::<Value>().next()? {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("State after marker '{}' is not valid JSON: {}", marker.as_str(), e);
            None
        }
    }
}

/// Numeric amounts truncate to whole units; text amounts go through the
/// price parser.
fn state_amount(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => parse_price(s),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::browser::RenderedPage;
    use crate::models::Category;

    const BASE: &str = "https://www.coupang.com";

    fn extractor() -> EmbeddedStateExtractor {
        EmbeddedStateExtractor::new(
            DEFAULT_STATE_MARKERS,
            BASE,
            Arc::new(CategoryClassifier::default()),
        )
        .unwrap()
    }

    fn nest(mut value: Value, levels: usize) -> Value {
        for _ in 0..levels {
            value = json!({ "child": value });
        }
        value
    }

    fn find(value: &Value) -> Vec<Product> {
        let mut products = Vec::new();
        extractor().search(value, 0, &mut products);
        products
    }

    #[test]
    fn test_product_fields_and_priorities() {
        let state = json!({
            "productName": "Apple 아이폰 15 128GB",
            "name": "ignored",
            "salePrice": "1,090,000원",
            "price": 1250000,
            "listPrice": 0,
            "originalPrice": "1,250,000",
            "productUrl": "/vp/products/7",
            "thumbnail": "//img.coupang.com/15.jpg"
        });
        let products = find(&state);
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.name, "Apple 아이폰 15 128GB");
        assert_eq!(p.price, 1_090_000);
        assert_eq!(p.original_price, 1_250_000);
        assert_eq!(p.url, "https://www.coupang.com/vp/products/7");
        assert_eq!(p.image, "//img.coupang.com/15.jpg");
        assert_eq!(p.category, Category::IPhone);
    }

    #[test]
    fn test_original_price_defaults_to_price() {
        let products = find(&json!({"title": "AirTag 4팩", "finalPrice": 139000}));
        assert_eq!(products[0].original_price, 139_000);

        let products = find(&json!({"name": "AirTag", "salePrice": 45000, "listPrice": 100}));
        assert_eq!(products[0].original_price, 45_000);
    }

    #[test]
    fn test_product_node_is_a_leaf() {
        let state = json!({
            "name": "iPad mini",
            "price": 749000,
            "variants": [{"name": "iPad mini 256GB", "price": 899000}]
        });
        let products = find(&state);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "iPad mini");
    }

    #[test]
    fn test_search_walks_objects_and_arrays() {
        let state = json!({
            "props": {"pageProps": {"items": [
                {"name": "AirPods 4", "price": 199000},
                {"meta": {"count": 2}},
                {"itemName": "HomePod", "salesPrice": "449,000"}
            ]}}
        });
        let names: Vec<String> = find(&state).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["AirPods 4", "HomePod"]);
    }

    #[test]
    fn test_product_shaped_without_price_is_dropped() {
        let state = json!([{"name": "Gift card", "price": 0}, {"name": "", "price": 10}]);
        assert!(find(&state).is_empty());
    }

    #[test]
    fn test_depth_bound() {
        let leaf = json!({"name": "Mac Studio", "price": 3290000});

        // 12 objects deep: the leaf sits at depth 11.
        assert!(find(&nest(leaf.clone(), 11)).is_empty());

        assert_eq!(find(&nest(leaf.clone(), 9)).len(), 1);
        assert_eq!(find(&nest(leaf, MAX_SEARCH_DEPTH)).len(), 1);
    }

    #[test]
    fn test_marker_extraction() {
        let script = r#"
            window.__INITIAL_STATE__ = {"product": {"productName": "Apple Watch Series 10", "salePrice": 599000}};
            window.other = 1;
        "#;
        let products = extractor().extract_from_script(script);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].category, Category::AppleWatch);
    }

    #[test]
    fn test_first_parsing_marker_wins() {
        let script = r#"
            window.__NEXT_DATA__ = {broken;
            window.__INITIAL_STATE__ = {"productList": [{"name": "Mac mini", "price": 890000}]};
            __data = {"list": [{"name": "Mac Pro", "price": 9999000}]};
        "#;
        let names: Vec<String> = extractor()
            .extract_from_script(script)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Mac mini"]);
    }

    #[test]
    fn test_prefilter_skips_unrelated_scripts() {
        let script = r#"window.__NEXT_DATA__ = {"name": "x", "cost": 1};"#;
        assert!(extractor().extract_from_script(script).is_empty());

        let script = "console.log('product price');";
        assert!(extractor().extract_from_script(script).is_empty());
    }

    #[test]
    fn test_invalid_marker_is_rejected() {
        let classifier = Arc::new(CategoryClassifier::default());
        assert!(EmbeddedStateExtractor::new(&["window.(unclosed"], BASE, classifier).is_err());
    }

    #[test]
    fn test_extract_from_page() {
        let html = r#"<html><head>
            <script src="/static/app.js"></script>
            <script>window.__NEXT_DATA__ = {"props": {"products": [
                {"name": "iPhone 16", "price": "1,250,000", "url": "/vp/products/16"}
            ]}};</script>
        </head><body></body></html>"#;
        let page = RenderedPage::parse(html, BASE);
        let products = extractor().extract(&page).unwrap().into_products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, 1_250_000);
        assert_eq!(products[0].url, "https://www.coupang.com/vp/products/16");
    }
}
