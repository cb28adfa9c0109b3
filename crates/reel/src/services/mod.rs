//! Concrete collaborators: HTTP services and local tools.
//!
//! Everything here sits behind a `reel_interface` trait; [`build_services`]
//! wires them from configuration.

mod dashscope;
mod documents;
mod download;
mod ffmpeg;
mod manim;
mod molecule;
mod rcsb;
mod tavus;

pub use dashscope::{DashScopeMedia, DashScopeSpeech};
pub use documents::LocalDocumentExtractor;
pub use download::HttpDownloader;
pub use ffmpeg::FfmpegComposer;
pub use manim::ManimRenderer;
pub use molecule::PymolRenderer;
pub use rcsb::RcsbStructures;
pub use tavus::TavusAvatar;

use crate::config::{ModelRoleConfig, ReelConfig};
use reel_error::{
    GenerationError, GenerationErrorKind, HttpError, JsonError, ReelResult, StorageError,
    StorageErrorKind,
};
use reel_generation::Services;
use reel_interface::{DocumentExtractor, LanguageModel};
use reel_model::{ModelClient, OpenAiBackend, RetryPolicy};
use reel_planning::prompts::SYSTEM_MESSAGE;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Build every collaborator from configuration.
///
/// # Errors
///
/// Returns a configuration error when an API key is missing or the HTTP
/// client cannot be built.
#[tracing::instrument(skip(config))]
pub fn build_services(config: &ReelConfig) -> ReelResult<Services> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| HttpError::new(format!("Failed to create HTTP client: {}", e)))?;
    let services = config.services();
    let render = services.render();

    let documents: Arc<dyn DocumentExtractor> = Arc::new(LocalDocumentExtractor::new(
        render.pdftotext(),
        render.pdftoppm(),
    ));
    let model = |role: &str, settings: &ModelRoleConfig| -> ReelResult<Arc<dyn LanguageModel>> {
        model_client(role, settings, config.retry(), *config.seed(), &http, &documents)
    };

    let built = Services::builder()
        .planner(model("planner", config.models().planner())?)
        .evaluator(model("evaluator", config.models().evaluator())?)
        .artist(model("artist", config.models().artist())?)
        .media(Arc::new(DashScopeMedia::new(http.clone(), services.media())?))
        .speech(Arc::new(DashScopeSpeech::new(http.clone(), services.speech())?))
        .talking_head(Arc::new(TavusAvatar::new(http.clone(), services.avatar())?))
        .downloader(Arc::new(HttpDownloader::new(http.clone())))
        .documents(documents.clone())
        .composer(Arc::new(FfmpegComposer::new(render.ffmpeg(), render.ffprobe())))
        .animator(Arc::new(ManimRenderer::new(render.manim())))
        .structures(Arc::new(RcsbStructures::new(http.clone(), services.structures())))
        .molecules(Arc::new(PymolRenderer::new(
            render.pymol(),
            render.ffmpeg(),
            *render.turntable_frames(),
            *render.turntable_fps(),
        )))
        .build()
        .map_err(|e| reel_error::ConfigError::new(format!("Incomplete service set: {}", e)))?;
    tracing::info!("Services ready");
    Ok(built)
}

fn model_client(
    role: &str,
    settings: &ModelRoleConfig,
    retry: &RetryPolicy,
    seed: u64,
    http: &reqwest::Client,
    documents: &Arc<dyn DocumentExtractor>,
) -> ReelResult<Arc<dyn LanguageModel>> {
    let backend = OpenAiBackend::new(settings.endpoint(), settings.api_key()?)
        .with_http_client(http.clone())
        .with_document_extractor(documents.clone());
    let mut client = ModelClient::new(role, settings.model(), backend)
        .with_system_message(
            settings
                .system_message()
                .clone()
                .unwrap_or_else(|| SYSTEM_MESSAGE.to_string()),
        )
        .with_retry_policy(retry.clone())
        .with_seed(seed);
    if let Some(temperature) = settings.temperature() {
        client = client.with_temperature(*temperature);
    }
    if let Some(max_tokens) = settings.max_tokens() {
        client = client.with_max_tokens(*max_tokens);
    }
    Ok(Arc::new(client))
}

/// Send `request` and decode a JSON body, treating any non-success status
/// as an HTTP error carrying the body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ReelResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpError::new(format!("Request failed: {}", e)))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| HttpError::new(format!("Failed to read response: {}", e)))?;
    if !status.is_success() {
        return Err(HttpError::new(format!("HTTP {}: {}", status, text)).into());
    }
    serde_json::from_str(&text).map_err(|e| {
        JsonError::new(format!(
            "Unexpected response ({}): {}",
            e,
            text.chars().take(200).collect::<String>()
        ))
        .into()
    })
}

/// Run a local tool and return its stdout. A non-zero exit becomes a media
/// error carrying the tail of stderr.
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> ReelResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| {
            GenerationError::new(GenerationErrorKind::Media(format!(
                "Failed to run {}: {}",
                program, e
            )))
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(20).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(GenerationError::new(GenerationErrorKind::Media(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            tail.join("\n")
        )))
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) async fn ensure_parent(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }
    Ok(())
}

/// Sibling of `destination` a producer writes into before publishing.
///
/// The extension is kept so tools still pick the right container.
pub(crate) fn staging_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    destination.with_file_name(name)
}

/// Run `produce` against a staging path and rename its output onto
/// `destination` once it succeeds.
///
/// Existence of `destination` is the cache key, so a failed or killed
/// producer must never leave a file there.
pub(crate) async fn produce_atomically<F, Fut>(destination: &Path, produce: F) -> ReelResult<PathBuf>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = ReelResult<()>>,
{
    ensure_parent(destination).await?;
    let staging = staging_path(destination);
    if let Err(e) = produce(staging.clone()).await {
        if tokio::fs::remove_file(&staging).await.is_ok() {
            tracing::debug!(staging = %staging.display(), "Discarded partial output");
        }
        return Err(e);
    }
    tokio::fs::rename(&staging, destination).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            destination.display(),
            e
        )))
    })?;
    Ok(destination.to_path_buf())
}

/// Break `text` into lines of at most `width` characters on word boundaries.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_path_keeps_the_extension() {
        assert_eq!(
            staging_path(Path::new("out/scene_0/scene0.mp4")),
            PathBuf::from("out/scene_0/scene0.partial.mp4")
        );
        assert_eq!(staging_path(Path::new("frames")), PathBuf::from("frames.partial"));
    }

    #[tokio::test]
    async fn failed_producer_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("scene_0/scene0.mp4");

        let result = produce_atomically(&destination, |staging| async move {
            tokio::fs::write(&staging, b"truncated").await.unwrap();
            Err(reel_error::ReelError::from(GenerationError::new(GenerationErrorKind::Media(
                "ffmpeg killed".to_string(),
            ))))
        })
        .await;

        assert!(result.is_err());
        assert!(!destination.exists());
        assert!(!staging_path(&destination).exists());
    }

    #[tokio::test]
    async fn successful_producer_publishes_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("scene_0/audio.wav");

        let path = produce_atomically(&destination, |staging| async move {
            tokio::fs::write(&staging, b"wav").await.unwrap();
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(path, destination);
        assert_eq!(std::fs::read(&destination).unwrap(), b"wav");
        assert!(!staging_path(&destination).exists());
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("attention is all you need for sequence transduction", 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), "attention is all you need for sequence transduction");
    }
}
