//! Document parsing.

use async_trait::async_trait;
use reel_core::DocumentRef;
use reel_error::ReelResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of asset lifted from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum AssetKind {
    /// A table
    #[display("table")]
    Table,
    /// A figure or image
    #[display("figure")]
    Figure,
}

impl AssetKind {
    /// Reads the planner's locator type ("TABLE", "IMAGE", "figure", ...).
    pub fn from_locator(text: &str) -> Self {
        if text.to_lowercase().contains("table") {
            AssetKind::Table
        } else {
            AssetKind::Figure
        }
    }
}

/// Extracts assets and text from source documents.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Render the `index`-th asset of `kind` (1-based) to an image at
    /// `destination`.
    async fn locate(
        &self,
        document: &DocumentRef,
        kind: AssetKind,
        index: u32,
        destination: &Path,
    ) -> ReelResult<PathBuf>;

    /// Full document text as markdown.
    async fn read_full_text(&self, document: &DocumentRef) -> ReelResult<String>;
}
