//! Attachments sent alongside a model prompt.

use crate::DocumentRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zero or more images and at most one document.
///
/// # Examples
///
/// ```
/// use reel_core::{Attachments, DocumentRef};
///
/// let attachments = Attachments::none()
///     .with_image("scene_0/frame1.png")
///     .with_document(DocumentRef::new("paper.pdf"));
/// assert_eq!(attachments.images().len(), 1);
/// assert!(attachments.document().is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Attachments {
    images: Vec<PathBuf>,
    document: Option<DocumentRef>,
}

impl Attachments {
    /// No attachments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Attachments consisting of images only.
    pub fn from_images<I, P>(images: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            images: images.into_iter().map(Into::into).collect(),
            document: None,
        }
    }

    /// Adds an image.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.images.push(path.into());
        self
    }

    /// Sets the document, replacing any previous one.
    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    /// True when nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.document.is_none()
    }
}
