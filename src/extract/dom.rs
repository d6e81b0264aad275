//! Selector-driven extraction from rendered product cards

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::{Extraction, Extractor, absolutize, first_success, try_first_success};
use crate::classify::CategoryClassifier;
use crate::config::CardSelectors;
use crate::models::Product;
use crate::price::parse_price;
use crate::traits::{ElementHandle, PageHandle};

/// Extracts one product per card element.
///
/// Container selectors are tried in order and the first one matching any
/// element decides the card set; results are never merged across selectors.
pub struct DomExtractor {
    label: &'static str,
    containers: Vec<String>,
    card: CardSelectors,
    base_url: String,
    classifier: Arc<CategoryClassifier>,
}

impl DomExtractor {
    pub fn new(
        label: &'static str,
        containers: Vec<String>,
        card: CardSelectors,
        base_url: impl Into<String>,
        classifier: Arc<CategoryClassifier>,
    ) -> Self {
        Self {
            label,
            containers,
            card,
            base_url: base_url.into(),
            classifier,
        }
    }

    /// Parse a single card. Cards without a name or a positive price yield
    /// `None`; an error means a card selector itself is unusable.
    pub fn parse_card<E: ElementHandle>(&self, card: &E) -> Result<Option<Product>> {
        let Some(name) = self.card_name(card)? else {
            return Ok(None);
        };

        let price = first_amount(card, &self.card.price)?;
        if price == 0 {
            return Ok(None);
        }
        let original_price = first_amount(card, &self.card.original_price)?;

        let url = card
            .query_one(&self.card.link)?
            .and_then(|link| link.attribute("href"))
            .map(|href| absolutize(&self.base_url, &href))
            .unwrap_or_default();

        let image = card
            .query_one(&self.card.image)?
            .and_then(|img| {
                first_success(&self.card.image_attributes, |attr| {
                    img.attribute(attr).filter(|src| !src.is_empty())
                })
            })
            .unwrap_or_default();

        let category = self.classifier.classify(&name);
        Ok(Some(Product::new(name, price, original_price, url, image, category)))
    }

    /// Title attribute beats element text; an image's alt text is the last resort.
    fn card_name<E: ElementHandle>(&self, card: &E) -> Result<Option<String>> {
        let name = try_first_success(&self.card.name, |selector| {
            Ok::<_, anyhow::Error>(card.query_one(selector)?.and_then(|node| {
                let text = node
                    .attribute("title")
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| node.text_content());
                non_empty(&text)
            }))
        })?;

        if name.is_some() {
            return Ok(name);
        }

        Ok(card
            .query_one(&self.card.name_fallback_image)?
            .and_then(|img| img.attribute("alt"))
            .and_then(|alt| non_empty(&alt)))
    }
}

impl<P: PageHandle> Extractor<P> for DomExtractor {
    fn name(&self) -> &'static str {
        self.label
    }

    fn extract(&self, page: &P) -> Result<Extraction> {
        let matched = first_success(&self.containers, |selector| match page.query_all(selector) {
            Ok(cards) if !cards.is_empty() => Some((selector, cards)),
            Ok(_) => None,
            Err(e) => {
                warn!("Skipping container selector: {}", e);
                None
            }
        });

        let Some((selector, cards)) = matched else {
            return Ok(Extraction::Empty);
        };
        info!("Selector '{}' matched {} elements", selector, cards.len());

        let products: Vec<Product> = cards
            .iter()
            .filter_map(|card| match self.parse_card(card) {
                Ok(product) => product,
                Err(e) => {
                    debug!("Skipping card: {}", e);
                    None
                }
            })
            .collect();

        Ok(products.into())
    }
}

/// First non-zero amount among `selectors`.
fn first_amount<E: ElementHandle>(card: &E, selectors: &[String]) -> Result<u64> {
    let amount = try_first_success(selectors, |selector| {
        Ok::<_, anyhow::Error>(
            card.query_one(selector)?
                .map(|node| parse_price(&node.text_content()))
                .filter(|amount| *amount > 0),
        )
    })?;
    Ok(amount.unwrap_or(0))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
