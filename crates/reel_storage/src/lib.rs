//! Per-document artifact persistence.
//!
//! [`ArtifactStore`] owns a document's working directory and addresses
//! every intermediate artifact through an [`ArtifactKind`]. Planning and
//! generation consult it before doing work so reruns skip finished scenes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod kind;
mod store;

pub use kind::ArtifactKind;
pub use store::ArtifactStore;
