//! Source document handles.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque handle to the source material of a run.
///
/// The handle is immutable for the lifetime of a run. Its [`id`](Self::id)
/// is the file stem and names the run's working directory.
///
/// # Examples
///
/// ```
/// use reel_core::DocumentRef;
///
/// let doc = DocumentRef::new("papers/attention.pdf");
/// assert_eq!(doc.id().as_str(), "attention");
/// assert!(!doc.is_remote());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{}", location)]
pub struct DocumentRef {
    location: String,
}

impl DocumentRef {
    /// Creates a handle from a path or URL.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// The path or URL as given.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// True for `http://` and `https://` locations.
    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    /// Local path, if the document is not remote.
    pub fn path(&self) -> Option<PathBuf> {
        (!self.is_remote()).then(|| PathBuf::from(&self.location))
    }

    /// Lowercase file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let tail = self.location.rsplit('/').next().unwrap_or(&self.location);
        Path::new(tail)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Identifier used to key every persisted artifact of this document.
    pub fn id(&self) -> DocumentId {
        let trimmed = self.location.trim_end_matches('/');
        let tail = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        let tail = tail.split(['?', '#']).next().unwrap_or(tail);
        let stem = Path::new(tail)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "document".to_string());
        DocumentId(stem)
    }
}

/// Stable identifier of a document, derived from its file stem.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an explicit identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_strips_directories_and_extension() {
        assert_eq!(DocumentRef::new("/tmp/in/report.v2.pdf").id().as_str(), "report.v2");
        assert_eq!(DocumentRef::new("notes.md").id().as_str(), "notes");
    }

    #[test]
    fn id_of_url_ignores_query() {
        let doc = DocumentRef::new("https://arxiv.org/pdf/1706.03762.pdf?download=1");
        assert!(doc.is_remote());
        assert_eq!(doc.id().as_str(), "1706.03762");
        assert_eq!(doc.path(), None);
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(DocumentRef::new("Paper.PDF").extension().as_deref(), Some("pdf"));
        assert_eq!(DocumentRef::new("README").extension(), None);
    }
}
