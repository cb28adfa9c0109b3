//! Filesystem artifact store.

use crate::ArtifactKind;
use reel_core::DocumentId;
use reel_error::{ReelResult, StorageError, StorageErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Persists the intermediate artifacts of one document run.
///
/// Every artifact is addressed by (document id, scene index, kind); the
/// document id selects `{output_root}/{id}/`, the kind selects the file
/// inside it. Existence of a file is the cache key that lets a run resume
/// at scene granularity.
///
/// # Example Structure
///
/// ```text
/// output/attention/
/// ├── logs/
/// │   ├── highplan.json
/// │   ├── file_0.json
/// │   ├── transcript.log
/// │   ├── workflow.log
/// │   └── final_video.mp4
/// └── scene_0/
///     ├── audio.wav
///     ├── test0.mp4
///     ├── video.mp4
///     └── scene0.mp4
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    document: DocumentId,
    work_dir: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the working directory of `document`
    /// under `output_root`.
    ///
    /// # Errors
    ///
    /// Returns error if the directories cannot be created.
    #[tracing::instrument(skip(output_root), fields(document = %document))]
    pub async fn open(output_root: impl AsRef<Path>, document: DocumentId) -> ReelResult<Self> {
        let work_dir = output_root.as_ref().join(document.as_str());
        let logs = work_dir.join("logs");
        tokio::fs::create_dir_all(&logs).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                logs.display(),
                e
            )))
        })?;

        tracing::info!(path = %work_dir.display(), "Opened artifact store");
        Ok(Self { document, work_dir })
    }

    /// Document this store belongs to.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// Root of the document's working directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Absolute path of an artifact, whether or not it exists.
    pub fn path(&self, kind: &ArtifactKind) -> PathBuf {
        self.work_dir.join(kind.relative_path())
    }

    /// Whether an artifact has been written.
    pub async fn exists(&self, kind: &ArtifactKind) -> bool {
        tokio::fs::try_exists(self.path(kind)).await.unwrap_or(false)
    }

    /// Path of an artifact, creating its parent directory.
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created.
    pub async fn prepare(&self, kind: &ArtifactKind) -> ReelResult<PathBuf> {
        let path = self.path(kind);
        if let Some(parent) = path.parent() {
            create_dir(parent).await?;
        }
        Ok(path)
    }

    /// Working directory of scene `index`, created if needed.
    pub async fn scene_dir(&self, index: usize) -> ReelResult<PathBuf> {
        let dir = self.work_dir.join(format!("scene_{}", index));
        create_dir(&dir).await?;
        Ok(dir)
    }

    /// Load a JSON artifact. `Ok(None)` when it has not been written.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or decoded.
    #[tracing::instrument(skip(self), fields(document = %self.document))]
    pub async fn load_json<T: DeserializeOwned>(&self, kind: &ArtifactKind) -> ReelResult<Option<T>> {
        let path = self.path(kind);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };
        let value = serde_json::from_str(&text).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        tracing::debug!(path = %path.display(), "Loaded cached artifact");
        Ok(Some(value))
    }

    /// Write a JSON artifact, pretty-printed.
    ///
    /// The file is written to a temporary sibling and renamed so a crash
    /// never leaves a half-written cache entry.
    #[tracing::instrument(skip(self, value), fields(document = %self.document))]
    pub async fn save_json<T: Serialize>(&self, kind: &ArtifactKind, value: &T) -> ReelResult<PathBuf> {
        let text = serde_json::to_string_pretty(value).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", kind, e)))
        })?;
        self.save_text(kind, &text).await
    }

    /// Write a text artifact atomically.
    pub async fn save_text(&self, kind: &ArtifactKind, text: &str) -> ReelResult<PathBuf> {
        let path = self.prepare(kind).await?;
        let tmp = path.with_extension("tmp");
        let write_err = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
        };
        tokio::fs::write(&tmp, text).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(write_err)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "Saved artifact");
        Ok(path)
    }

    /// Copy a file into an artifact slot.
    ///
    /// Like [`save_text`](Self::save_text), the copy lands in a temporary
    /// sibling first; the slot only appears once the copy is complete.
    pub async fn adopt(&self, source: &Path, kind: &ArtifactKind) -> ReelResult<PathBuf> {
        let path = self.prepare(kind).await?;
        let tmp = path.with_extension("tmp");
        let copy_err = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{} -> {}: {}",
                source.display(),
                path.display(),
                e
            )))
        };
        if let Err(e) = tokio::fs::copy(source, &tmp).await {
            if tokio::fs::remove_file(&tmp).await.is_ok() {
                tracing::debug!(tmp = %tmp.display(), "Discarded partial copy");
            }
            return Err(copy_err(e).into());
        }
        tokio::fs::rename(&tmp, &path).await.map_err(copy_err)?;
        Ok(path)
    }
}

async fn create_dir(dir: &Path) -> ReelResult<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        StorageError::new(StorageErrorKind::DirectoryCreation(format!(
            "{}: {}",
            dir.display(),
            e
        )))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::{SceneDescriptor, ScenePlan};

    #[tokio::test]
    async fn layout_follows_document_id() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let store = ArtifactStore::open(root.path(), DocumentId::new("paper")).await?;

        assert!(store.work_dir().join("logs").is_dir());
        assert_eq!(
            store.path(&ArtifactKind::ScenePlan(2)),
            root.path().join("paper/logs/file_2.json")
        );
        assert_eq!(
            store.path(&ArtifactKind::Segment(3)),
            root.path().join("paper/scene_3/scene3.mp4")
        );
        assert_eq!(
            store.path(&ArtifactKind::VideoCandidate { scene: 1, attempt: 4 }),
            root.path().join("paper/scene_1/test4.mp4")
        );
        Ok(())
    }

    #[tokio::test]
    async fn json_round_trip_and_cache_miss() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let store = ArtifactStore::open(root.path(), DocumentId::new("paper")).await?;
        let kind = ArtifactKind::ScenePlan(0);

        assert!(!store.exists(&kind).await);
        assert_eq!(store.load_json::<ScenePlan>(&kind).await?, None);

        let plan = ScenePlan::for_scene(&SceneDescriptor::new("Intro", "Hook", "8s"))
            .with_style("Slides");
        store.save_json(&kind, &plan).await?;

        assert!(store.exists(&kind).await);
        assert_eq!(store.load_json::<ScenePlan>(&kind).await?, Some(plan));
        assert!(!store.path(&kind).with_extension("tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn failed_adopt_leaves_the_slot_empty() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let store = ArtifactStore::open(root.path(), DocumentId::new("paper")).await?;
        let kind = ArtifactKind::Video(0);

        let missing = root.path().join("never_rendered.mp4");
        assert!(store.adopt(&missing, &kind).await.is_err());
        assert!(!store.exists(&kind).await);

        let candidate = root.path().join("test1.mp4");
        std::fs::write(&candidate, b"mp4")?;
        let path = store.adopt(&candidate, &kind).await?;
        assert_eq!(std::fs::read(&path)?, b"mp4");
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_artifact_is_an_error() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let store = ArtifactStore::open(root.path(), DocumentId::new("paper")).await?;
        store.save_text(&ArtifactKind::HighPlan, "{not json").await?;

        let err = store
            .load_json::<Vec<SceneDescriptor>>(&ArtifactKind::HighPlan)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Corrupt"));
        Ok(())
    }
}
