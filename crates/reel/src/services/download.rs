//! Fetch remote results to local files.

use super::produce_atomically;
use async_trait::async_trait;
use reel_error::{HttpError, ReelError, ReelResult, StorageError, StorageErrorKind};
use reel_interface::Downloader;
use std::path::{Path, PathBuf};

/// Plain HTTP GET downloader.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Downloader sharing `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[tracing::instrument(skip(self, destination), fields(destination = %destination.display()))]
    async fn download(&self, url: &str, destination: &Path) -> ReelResult<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Download failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(HttpError::new(format!("HTTP {} for {}", response.status(), url)).into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read download: {}", e)))?;

        let path = produce_atomically(destination, |staging| async move {
            tokio::fs::write(&staging, &bytes).await.map_err(|e| {
                ReelError::from(StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    staging.display(),
                    e
                ))))
            })
        })
        .await?;
        tracing::debug!(path = %path.display(), "Downloaded");
        Ok(path)
    }
}
