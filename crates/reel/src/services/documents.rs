//! Local document parsing with poppler tools.

use super::{produce_atomically, run_tool};
use async_trait::async_trait;
use reel_core::DocumentRef;
use reel_error::{
    GenerationError, GenerationErrorKind, ReelError, ReelResult, StorageError, StorageErrorKind,
};
use reel_interface::{AssetKind, DocumentExtractor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Reads text with `pdftotext` and renders asset pages with `pdftoppm`.
///
/// Pre-extracted assets in a sibling `<stem>_assets/` directory named
/// `table2.png`, `figure3.jpg` and so on take precedence over page renders.
pub struct LocalDocumentExtractor {
    pdftotext: String,
    pdftoppm: String,
    text_cache: Mutex<HashMap<PathBuf, String>>,
}

impl LocalDocumentExtractor {
    /// Extractor calling the given poppler executables.
    pub fn new(pdftotext: &str, pdftoppm: &str) -> Self {
        Self {
            pdftotext: pdftotext.to_string(),
            pdftoppm: pdftoppm.to_string(),
            text_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Render one PDF page to `target` as PNG.
    async fn render_page(&self, pdf: &Path, page: u32, target: PathBuf) -> ReelResult<()> {
        // pdftoppm appends the extension to the output root.
        let root = target.with_extension("");
        run_tool(
            &self.pdftoppm,
            [
                "-png".to_string(),
                "-r".to_string(),
                "150".to_string(),
                "-f".to_string(),
                page.to_string(),
                "-l".to_string(),
                page.to_string(),
                "-singlefile".to_string(),
                pdf.to_string_lossy().into_owned(),
                root.to_string_lossy().into_owned(),
            ],
        )
        .await?;
        let rendered = root.with_extension("png");
        if rendered != target {
            tokio::fs::rename(&rendered, &target).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    target.display(),
                    e
                )))
            })?;
        }
        Ok(())
    }

    async fn pdf_text(&self, path: &Path) -> ReelResult<String> {
        let mut cache = self.text_cache.lock().await;
        if let Some(text) = cache.get(path) {
            return Ok(text.clone());
        }
        let text = run_tool(
            &self.pdftotext,
            [
                "-layout".to_string(),
                path.to_string_lossy().into_owned(),
                "-".to_string(),
            ],
        )
        .await?;
        cache.insert(path.to_path_buf(), text.clone());
        Ok(text)
    }
}

fn missing(message: String) -> reel_error::ReelError {
    GenerationError::new(GenerationErrorKind::MissingAsset(message)).into()
}

fn local_path(document: &DocumentRef) -> ReelResult<PathBuf> {
    document
        .path()
        .ok_or_else(|| missing(format!("{} is not a local file", document)))
}

fn caption_labels(kind: AssetKind) -> &'static [&'static str] {
    match kind {
        AssetKind::Table => &["table"],
        AssetKind::Figure => &["figure", "fig."],
    }
}

/// True when `line` opens a caption for asset `index` of `kind`, as in
/// "Table 2:" or "Fig. 3." but not "Table 21".
fn is_caption(line: &str, kind: AssetKind, index: u32) -> bool {
    let line = line.trim_start().to_lowercase();
    let number = index.to_string();
    caption_labels(kind).iter().any(|label| {
        line.strip_prefix(label)
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix(number.as_str()))
            .map(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(false)
    })
}

/// 1-based page holding the caption of the requested asset. Pages are
/// separated by form feeds in `pdftotext` output.
fn caption_page(text: &str, kind: AssetKind, index: u32) -> Option<u32> {
    text.split('\u{c}')
        .position(|page| page.lines().any(|line| is_caption(line, kind, index)))
        .map(|i| i as u32 + 1)
}

async fn prepared_asset(document: &Path, kind: AssetKind, index: u32) -> Option<PathBuf> {
    let stem = document.file_stem()?.to_string_lossy().into_owned();
    let dir = document.parent()?.join(format!("{}_assets", stem));
    for ext in IMAGE_EXTENSIONS {
        let candidate = dir.join(format!("{}{}.{}", kind, index, ext));
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

#[async_trait]
impl DocumentExtractor for LocalDocumentExtractor {
    #[tracing::instrument(skip(self, destination), fields(document = %document))]
    async fn locate(
        &self,
        document: &DocumentRef,
        kind: AssetKind,
        index: u32,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        let path = local_path(document)?;
        if let Some(prepared) = prepared_asset(&path, kind, index).await {
            tracing::debug!(source = %prepared.display(), "Using pre-extracted asset");
            return produce_atomically(destination, |staging| async move {
                tokio::fs::copy(&prepared, &staging).await.map(|_| ()).map_err(|e| {
                    ReelError::from(StorageError::new(StorageErrorKind::FileWrite(format!(
                        "{}: {}",
                        staging.display(),
                        e
                    ))))
                })
            })
            .await;
        }

        let text = self.read_full_text(document).await?;
        let page = caption_page(&text, kind, index)
            .ok_or_else(|| missing(format!("{} {} in {}", kind, index, document)))?;
        tracing::debug!(page, "Rendering asset page");

        produce_atomically(destination, |staging| self.render_page(&path, page, staging)).await
    }

    async fn read_full_text(&self, document: &DocumentRef) -> ReelResult<String> {
        let path = local_path(document)?;
        match document.extension().as_deref() {
            Some("pdf") => self.pdf_text(&path).await,
            _ => tokio::fs::read_to_string(&path).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into()
            }),
        }
    }
}
