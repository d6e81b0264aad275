//! Ordered strategy cascade with short-circuit on the first non-empty result

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::dom::DomExtractor;
use super::embedded::EmbeddedStateExtractor;
use super::structured::StructuredMetadataExtractor;
use super::{Extraction, Extractor, first_success};
use crate::classify::CategoryClassifier;
use crate::config::ScraperConfig;
use crate::models::Product;
use crate::traits::PageHandle;

/// Where a strategy ended up during one cascade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    NotAttempted,
    /// Ran and found nothing, or failed.
    Empty,
    /// Ran and found this many candidates.
    Succeeded(usize),
}

/// Result of one cascade run.
#[derive(Debug)]
pub struct CascadeOutcome {
    /// Strategy name and final state, in cascade order.
    pub states: Vec<(&'static str, StrategyState)>,
    /// Name of the strategy whose output was returned.
    pub winner: Option<&'static str>,
    pub products: Vec<Product>,
}

pub struct ExtractionCascade<P: PageHandle> {
    strategies: Vec<Box<dyn Extractor<P>>>,
}

impl<P: PageHandle> ExtractionCascade<P> {
    pub fn new(strategies: Vec<Box<dyn Extractor<P>>>) -> Self {
        Self { strategies }
    }

    /// JSON-LD, then embedded state, then product-card DOM.
    pub fn standard(config: &ScraperConfig, classifier: Arc<CategoryClassifier>) -> Result<Self> {
        let structured = StructuredMetadataExtractor::new(config.base_url.as_str(), Arc::clone(&classifier));
        let embedded = EmbeddedStateExtractor::new(
            config.state_markers.as_slice(),
            config.base_url.as_str(),
            Arc::clone(&classifier),
        )?;
        let dom = DomExtractor::new(
            "dom",
            config.selectors.shop_containers.clone(),
            config.selectors.card.clone(),
            config.base_url.as_str(),
            classifier,
        );

        let strategies: Vec<Box<dyn Extractor<P>>> =
            vec![Box::new(structured), Box::new(embedded), Box::new(dom)];
        Ok(Self::new(strategies))
    }

    /// Run strategies in order until one finds candidates. Strategy errors
    /// are logged and count as an empty result.
    pub fn run(&self, page: &P) -> CascadeOutcome {
        let mut states: Vec<(&'static str, StrategyState)> = self
            .strategies
            .iter()
            .map(|s| (s.name(), StrategyState::NotAttempted))
            .collect();

        let found = first_success(self.strategies.iter().enumerate(), |(index, strategy)| {
            let extraction = strategy.extract(page).unwrap_or_else(|e| {
                warn!("Strategy {} failed on {}: {:#}", strategy.name(), page.url(), e);
                Extraction::Empty
            });

            match extraction {
                Extraction::Found(products) => {
                    debug!("Strategy {} found {} candidates", strategy.name(), products.len());
                    states[index].1 = StrategyState::Succeeded(products.len());
                    Some((strategy.name(), products))
                }
                Extraction::Empty => {
                    debug!("Strategy {} found nothing", strategy.name());
                    states[index].1 = StrategyState::Empty;
                    None
                }
            }
        });

        let (winner, products) = match found {
            Some((winner, products)) => (Some(winner), products),
            None => (None, Vec::new()),
        };
        CascadeOutcome {
            states,
            winner,
            products,
        }
    }
}
