//! Media composition and rendering.

use async_trait::async_trait;
use reel_core::Alignment;
use reel_error::ReelResult;
use std::path::{Path, PathBuf};

/// Local media operations: probing, frame sampling, muxing, compositing.
#[async_trait]
pub trait MediaComposer: Send + Sync {
    /// Duration of an audio or video file in seconds.
    async fn probe_duration(&self, media: &Path) -> ReelResult<f64>;

    /// Extract one frame per timestamp (seconds) into `dest_dir`.
    async fn key_frames(&self, video: &Path, times: &[f64], dest_dir: &Path)
    -> ReelResult<Vec<PathBuf>>;

    /// Apply `alignment` and mux `video` with `audio` into `destination`.
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        alignment: &Alignment,
        destination: &Path,
    ) -> ReelResult<PathBuf>;

    /// Turn a still image into a video of `seconds` on a 1920x1080 canvas.
    async fn still_to_video(&self, image: &Path, seconds: f64, destination: &Path)
    -> ReelResult<PathBuf>;

    /// Lay out `image` with `caption` as a presentation slide.
    async fn compose_slide(&self, image: &Path, caption: &str, destination: &Path)
    -> ReelResult<PathBuf>;

    /// Concatenate segments in order.
    async fn concat(&self, segments: &[PathBuf], destination: &Path) -> ReelResult<PathBuf>;
}

/// Renders generated animation code to video.
///
/// Any `Err` is treated as a render exception; its message is fed back into
/// a code-repair request.
#[async_trait]
pub trait AnimationRenderer: Send + Sync {
    /// Render `code` (an `animate` method body) for a scene titled
    /// `scenario` with narration `narration`.
    async fn render(
        &self,
        code: &str,
        scenario: &str,
        narration: &str,
        destination: &Path,
    ) -> ReelResult<PathBuf>;
}

/// Protein/molecule structure lookup.
#[async_trait]
pub trait StructureDatabase: Send + Sync {
    /// Identifiers matching a molecule name, best first. Empty when nothing
    /// matches.
    async fn resolve(&self, name: &str) -> ReelResult<Vec<String>>;

    /// Download the structure file for `id` to `destination`.
    async fn fetch(&self, id: &str, destination: &Path) -> ReelResult<PathBuf>;
}

/// Renders a structure file as a rotating turntable clip.
#[async_trait]
pub trait MoleculeRenderer: Send + Sync {
    /// Render `structure` to `destination`.
    async fn render_turntable(&self, structure: &Path, destination: &Path) -> ReelResult<PathBuf>;
}
