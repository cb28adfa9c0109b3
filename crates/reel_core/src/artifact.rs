//! Produced media.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A produced image, video or audio file.
///
/// Immutable once written; existence of the file is its cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct MediaArtifact {
    path: PathBuf,
    duration: Option<f64>,
}

impl MediaArtifact {
    /// Artifact at `path` with unknown duration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration: None,
        }
    }

    /// Sets the declared duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// The finished video for one scene: visual plus narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Segment {
    index: usize,
    path: PathBuf,
    from_cache: bool,
}

impl Segment {
    /// Freshly produced segment.
    pub fn produced(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            from_cache: false,
        }
    }

    /// Segment found on disk from a previous run.
    pub fn cached(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            from_cache: true,
        }
    }
}
