//! Result artifact persistence

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::ResultSet;

const DEBUG_PAGE_FILE: &str = "debug_brandshop.html";

/// Writes the JSON catalog and debug page dumps under a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    output_file: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_file: output_file.into(),
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Serialize `result` as pretty-printed UTF-8 JSON.
    pub async fn save(&self, result: &ResultSet) -> Result<()> {
        if let Some(parent) = self.output_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(result)?;
        tokio::fs::write(&self.output_file, json)
            .await
            .with_context(|| format!("Failed to write {}", self.output_file.display()))?;

        info!(
            "Saved {} products to {}",
            result.total_products,
            self.output_file().display()
        );
        Ok(())
    }

    /// Keep the markup of a page nothing could be extracted from.
    pub async fn save_debug_page(&self, content: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let path = self.data_dir.join(DEBUG_PAGE_FILE);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
