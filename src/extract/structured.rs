//! JSON-LD structured metadata extraction

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Extraction, Extractor, absolutize, first_present, scalar_text};
use crate::classify::CategoryClassifier;
use crate::models::Product;
use crate::traits::{ElementHandle, PageHandle};

const LD_JSON_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Reads schema.org `Product` and `ItemList` objects from JSON-LD scripts.
pub struct StructuredMetadataExtractor {
    base_url: String,
    classifier: Arc<CategoryClassifier>,
}

impl StructuredMetadataExtractor {
    pub fn new(base_url: impl Into<String>, classifier: Arc<CategoryClassifier>) -> Self {
        Self {
            base_url: base_url.into(),
            classifier,
        }
    }

    /// Parse one JSON-LD payload into candidates.
    ///
    /// A payload that is not valid JSON is an error; individual objects that
    /// fail to parse are skipped and their siblings kept.
    pub fn parse_payload(&self, payload: &str) -> Result<Vec<Product>> {
        let value: Value = serde_json::from_str(payload.trim())?;
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut products = Vec::new();
        for item in &items {
            let Some(object) = item.as_object() else {
                continue;
            };

            if has_type(object, "ItemList") {
                let elements = object
                    .get("itemListElement")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for element in elements {
                    let target = element.get("item").unwrap_or(element);
                    self.push_product(target, &mut products);
                }
            } else if has_type(object, "Product") {
                self.push_product(item, &mut products);
            }
        }

        Ok(products)
    }

    fn push_product(&self, value: &Value, products: &mut Vec<Product>) {
        match self.parse_product(value) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {}
            Err(e) => debug!("Skipping JSON-LD product: {}", e),
        }
    }

    fn parse_product(&self, value: &Value) -> Result<Option<Product>> {
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("product entry is not an object"))?;

        let name = object.get("name").and_then(scalar_text).unwrap_or_default();
        if name.trim().is_empty() {
            return Ok(None);
        }

        let offer = match object.get("offers") {
            Some(Value::Array(offers)) => offers.first(),
            Some(offer @ Value::Object(_)) => Some(offer),
            _ => None,
        };
        let offer = offer.and_then(Value::as_object);

        let price = match offer.and_then(|o| first_present(o, &["price", "lowPrice"])) {
            Some(v) => offer_amount(v)?,
            None => 0,
        };
        let high_price = match offer.and_then(|o| o.get("highPrice")) {
            Some(v) => offer_amount(v)?,
            None => 0,
        };

        let url = object
            .get("url")
            .and_then(scalar_text)
            .map(|href| absolutize(&self.base_url, &href))
            .unwrap_or_default();
        let image = object.get("image").map(image_reference).unwrap_or_default();
        let category = self.classifier.classify(&name);

        Ok(Some(Product::new(name, price, high_price, url, image, category)))
    }
}

impl<P: PageHandle> Extractor<P> for StructuredMetadataExtractor {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn extract(&self, page: &P) -> Result<Extraction> {
        let mut products = Vec::new();
        for script in page.query_all(LD_JSON_SELECTOR)? {
            match self.parse_payload(&script.text_content()) {
                Ok(found) => products.extend(found),
                Err(e) => debug!("Skipping malformed JSON-LD payload: {}", e),
            }
        }
        Ok(products.into())
    }
}

/// `@type` may be a single name or a list of names.
fn has_type(object: &Map<String, Value>, wanted: &str) -> bool {
    match object.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Offer prices are decimal numbers or numeric strings; both truncate to
/// whole currency units.
fn offer_amount(value: &Value) -> Result<u64> {
    let amount = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("price {} is not representable", n))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| anyhow!("invalid offer price '{}': {}", s, e))?,
        other => return Err(anyhow!("unexpected offer price {}", other)),
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(anyhow!("invalid offer price {}", amount));
    }
    Ok(amount.trunc() as u64)
}

/// `image` is a URL, a list of URLs, or an `ImageObject`.
fn image_reference(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().map(image_reference).unwrap_or_default(),
        Value::Object(object) => object.get("url").and_then(scalar_text).unwrap_or_default(),
        _ => String::new(),
    }
}
