//! Product extraction strategies and the helpers they share
//!
//! Three independent strategies locate product data in a rendered page:
//!
//! - [`structured`]: JSON-LD `Product` / `ItemList` markup
//! - [`embedded`]: serialized application state assigned in inline scripts
//! - [`dom`]: selector-driven walk over product card elements
//!
//! [`cascade`] runs them in that order and stops at the first one that finds
//! anything. Everything is built from the same "first success wins" shape:
//! ordered candidates tried one by one until one produces a value.

pub mod cascade;
pub mod dom;
pub mod embedded;
pub mod structured;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::models::Product;
use crate::traits::PageHandle;

/// Outcome of one extraction strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// At least one candidate was found.
    Found(Vec<Product>),
    /// The strategy ran and found nothing.
    Empty,
}

impl Extraction {
    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Found(products) => products,
            Self::Empty => Vec::new(),
        }
    }
}

impl From<Vec<Product>> for Extraction {
    fn from(products: Vec<Product>) -> Self {
        if products.is_empty() {
            Self::Empty
        } else {
            Self::Found(products)
        }
    }
}

/// A strategy for pulling product candidates out of a page.
pub trait Extractor<P: PageHandle> {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Run the strategy against `page`.
    ///
    /// # Returns
    /// * `Result<Extraction>` - Candidates found, `Empty`, or an error the
    ///   caller should treat as `Empty`
    fn extract(&self, page: &P) -> Result<Extraction>;
}

/// Try `candidates` in order, returning the first value `attempt` produces.
pub fn first_success<C, T>(
    candidates: impl IntoIterator<Item = C>,
    attempt: impl FnMut(C) -> Option<T>,
) -> Option<T> {
    candidates.into_iter().find_map(attempt)
}

/// Fallible form of [`first_success`]: an error from any attempt stops the
/// search and is returned.
pub fn try_first_success<C, T, E>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: impl FnMut(C) -> Result<Option<T>, E>,
) -> Result<Option<T>, E> {
    for candidate in candidates {
        if let Some(value) = attempt(candidate)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Whether a JSON value carries something: not null, `false`, zero, or empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Value of the first key in `keys` that holds a present value.
pub fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    first_success(keys, |key| object.get(*key).filter(|v| is_present(v)))
}

/// Render a scalar JSON value as text. Containers and null yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolve a link against the site root. Protocol-relative links get
/// `https:`, root-relative paths get `base_url`, anything else is kept.
pub fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
