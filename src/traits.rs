//! Traits at the boundary with the page-rendering collaborator

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Page lifecycle point a navigation waits for before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum WaitUntil {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

/// A rendered page that can be queried with CSS selectors.
pub trait PageHandle {
    type Element<'a>: ElementHandle
    where
        Self: 'a;

    /// All elements matching `selector`, in document order.
    ///
    /// # Returns
    /// * `Result<Vec<_>>` - Matching elements (possibly none), or an error if
    ///   the selector is malformed
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Element<'_>>>;

    /// Full serialized markup of the page.
    fn content(&self) -> String;

    /// Address the page was loaded from.
    fn url(&self) -> &str;
}

/// A single element inside a [`PageHandle`].
pub trait ElementHandle: Sized {
    /// First descendant matching `selector`, if any.
    fn query_one(&self, selector: &str) -> Result<Option<Self>>;

    /// Attribute value, or `None` when the attribute is absent.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text of the element and its descendants.
    fn text_content(&self) -> String;
}

/// Browser-automation engine that fetches and renders pages.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, blocking until `wait` is reached or `timeout` elapses.
    ///
    /// # Arguments
    /// * `url` - The address to load
    /// * `wait` - The lifecycle point to wait for
    /// * `timeout` - Upper bound for the whole navigation
    async fn navigate(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// Run a script in the current page and return its JSON-encoded result.
    async fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Serialized markup of the current page.
    fn page_content(&self) -> Result<String>;

    /// Address of the current page, if a navigation has completed.
    fn current_url(&self) -> Option<&str>;
}
