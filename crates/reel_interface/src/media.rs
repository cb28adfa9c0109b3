//! Media generation, speech and avatar services.

use async_trait::async_trait;
use reel_error::ReelResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a media task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum MediaTaskKind {
    /// Text-to-video
    #[display("video")]
    Video,
    /// Text-to-image
    #[display("image")]
    Image,
}

/// Parameters of an asynchronous media generation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTaskRequest {
    /// Output kind
    pub kind: MediaTaskKind,
    /// Generation prompt
    pub prompt: String,
    /// Output size, e.g. "1280*720"
    pub size: Option<String>,
}

impl MediaTaskRequest {
    /// Video task for `prompt`.
    pub fn video(prompt: impl Into<String>) -> Self {
        Self {
            kind: MediaTaskKind::Video,
            prompt: prompt.into(),
            size: None,
        }
    }

    /// Image task for `prompt`.
    pub fn image(prompt: impl Into<String>) -> Self {
        Self {
            kind: MediaTaskKind::Image,
            prompt: prompt.into(),
            size: None,
        }
    }
}

/// State of a long-running remote task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Still running
    Pending,
    /// Finished; the result can be downloaded from `url`
    Succeeded {
        /// Result location
        url: String,
    },
    /// Finished unsuccessfully
    Failed {
        /// Reason reported by the service
        reason: String,
    },
}

/// Asynchronous text-to-video / text-to-image service.
#[async_trait]
pub trait MediaTaskService: Send + Sync {
    /// Submit a task and return its identifier.
    async fn create_task(&self, request: &MediaTaskRequest) -> ReelResult<String>;

    /// Query the state of a submitted task.
    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus>;
}

/// Presenter-avatar service driven by a narration audio URL.
#[async_trait]
pub trait TalkingHeadService: Send + Sync {
    /// Submit a talking-head video job.
    async fn create_task(&self, audio_url: &str, script: &str) -> ReelResult<String>;

    /// Query the state of a submitted job.
    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration and return a URL of the audio.
    async fn synthesize(&self, text: &str) -> ReelResult<String>;
}

/// Fetches remote results to local files.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `destination` and return the local path.
    async fn download(&self, url: &str, destination: &Path) -> ReelResult<PathBuf>;
}
