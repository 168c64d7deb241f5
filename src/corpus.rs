use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Bookkeeping key in the scraped-content blob, not page content.
const RESERVED_KEY: &str = "processed_urls";

/// The grounding text supplied to every remote call: all scraped pages
/// concatenated into one bounded, read-only string shared by all sessions.
#[derive(Debug, Clone)]
pub struct Corpus {
    text: Arc<str>,
}

impl Corpus {
    /// Load the scraped-content JSON map (source URL -> page text) and
    /// concatenate it, excluding the reserved bookkeeping key and truncating
    /// to `limit` bytes to bound payload cost.
    pub async fn load(path: impl AsRef<Path>, limit: usize) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;

        let map: serde_json::Map<String, Value> =
            serde_json::from_str(&raw).context("Corpus file is not a JSON object")?;

        let corpus = Self::from_scraped(&map, limit);
        info!(
            "Corpus loaded from {}: {} sources, {} bytes",
            path.display(),
            map.len(),
            corpus.text.len()
        );
        Ok(corpus)
    }

    pub fn from_scraped(map: &serde_json::Map<String, Value>, limit: usize) -> Self {
        let text = map
            .iter()
            .filter(|(key, _)| key.as_str() != RESERVED_KEY)
            .filter_map(|(url, content)| {
                content.as_str().map(|c| format!("Source: {}\n{}", url, c))
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            text: truncate_to(text, limit).into(),
        }
    }

    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into().into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Byte-bounded truncation that never splits a UTF-8 character.
fn truncate_to(mut s: String, limit: usize) -> String {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    s
}
