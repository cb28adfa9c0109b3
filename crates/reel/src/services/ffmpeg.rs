//! ffmpeg/ffprobe composition.

use super::{ensure_parent, produce_atomically, run_tool, wrap};
use async_trait::async_trait;
use reel_core::Alignment;
use reel_error::{GenerationError, GenerationErrorKind, ReelResult, StorageError, StorageErrorKind};
use reel_interface::MediaComposer;
use std::path::{Path, PathBuf};

/// Output canvas for every segment.
const CANVAS: (u32, u32) = (1920, 1080);
const FRAME_RATE: u32 = 30;

/// Composer backed by the ffmpeg command-line tools.
pub struct FfmpegComposer {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegComposer {
    /// Composer calling the given executables.
    pub fn new(ffmpeg: &str, ffprobe: &str) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
        }
    }

    async fn ffmpeg(&self, args: Vec<String>) -> ReelResult<()> {
        let mut full = vec!["-y".to_string(), "-loglevel".to_string(), "error".to_string()];
        full.extend(args);
        run_tool(&self.ffmpeg, full).await.map(|_| ())
    }
}

fn fit_canvas() -> String {
    let (w, h) = CANVAS;
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
    )
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Escape text for the drawtext filter.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
        .replace(',', "\\,")
        .replace('%', "\\%")
}

fn mux_filter(alignment: &Alignment) -> String {
    let mut filter = format!(
        "[0:v]setpts=PTS/{speed},{canvas},tpad=stop_mode=clone:stop=-1,fps={FRAME_RATE}[v]",
        speed = alignment.video_speed,
        canvas = fit_canvas(),
    );
    match alignment.pad_audio_to {
        Some(_) => filter.push_str(";[1:a]apad[a]"),
        None => filter.push_str(";[1:a]anull[a]"),
    }
    filter
}

fn media_error(message: String) -> reel_error::ReelError {
    GenerationError::new(GenerationErrorKind::Media(message)).into()
}

#[async_trait]
impl MediaComposer for FfmpegComposer {
    async fn probe_duration(&self, media: &Path) -> ReelResult<f64> {
        let stdout = run_tool(
            &self.ffprobe,
            [
                "-v".to_string(),
                "error".to_string(),
                "-show_entries".to_string(),
                "format=duration".to_string(),
                "-of".to_string(),
                "default=noprint_wrappers=1:nokey=1".to_string(),
                path_arg(media),
            ],
        )
        .await?;
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|e| media_error(format!("Unreadable duration for {}: {}", media.display(), e)))
    }

    #[tracing::instrument(skip(self, times), fields(video = %video.display(), frames = times.len()))]
    async fn key_frames(
        &self,
        video: &Path,
        times: &[f64],
        dest_dir: &Path,
    ) -> ReelResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dest_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dest_dir.display(),
                e
            )))
        })?;
        let mut frames = Vec::with_capacity(times.len());
        for (i, time) in times.iter().enumerate() {
            let frame = dest_dir.join(format!("frame{}.png", i));
            self.ffmpeg(vec![
                "-ss".to_string(),
                format!("{:.3}", time),
                "-i".to_string(),
                path_arg(video),
                "-frames:v".to_string(),
                "1".to_string(),
                path_arg(&frame),
            ])
            .await?;
            frames.push(frame);
        }
        Ok(frames)
    }

    #[tracing::instrument(skip(self), fields(destination = %destination.display()))]
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        alignment: &Alignment,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        produce_atomically(destination, |staging| async move {
            self.ffmpeg(vec![
                "-i".to_string(),
                path_arg(video),
                "-i".to_string(),
                path_arg(audio),
                "-filter_complex".to_string(),
                mux_filter(alignment),
                "-map".to_string(),
                "[v]".to_string(),
                "-map".to_string(),
                "[a]".to_string(),
                "-t".to_string(),
                format!("{:.3}", alignment.output_duration),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                path_arg(&staging),
            ])
            .await
        })
        .await
    }

    async fn still_to_video(
        &self,
        image: &Path,
        seconds: f64,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        produce_atomically(destination, |staging| async move {
            self.ffmpeg(vec![
                "-loop".to_string(),
                "1".to_string(),
                "-i".to_string(),
                path_arg(image),
                "-t".to_string(),
                format!("{:.3}", seconds),
                "-vf".to_string(),
                format!("{},fps={FRAME_RATE}", fit_canvas()),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                path_arg(&staging),
            ])
            .await
        })
        .await
    }

    #[tracing::instrument(skip(self, caption), fields(image = %image.display()))]
    async fn compose_slide(
        &self,
        image: &Path,
        caption: &str,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        let (w, h) = CANVAS;
        let asset_height = h * 3 / 4;
        let mut filter = format!(
            "scale={w}:{asset_height}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:40:white"
        );
        for (i, line) in wrap(caption, 70).iter().enumerate() {
            filter.push_str(&format!(
                ",drawtext=text='{}':fontsize=40:fontcolor=black:x=(w-text_w)/2:y={}",
                escape_drawtext(line),
                asset_height + 80 + i as u32 * 52
            ));
        }
        produce_atomically(destination, |staging| async move {
            self.ffmpeg(vec![
                "-i".to_string(),
                path_arg(image),
                "-vf".to_string(),
                filter,
                "-frames:v".to_string(),
                "1".to_string(),
                path_arg(&staging),
            ])
            .await
        })
        .await
    }

    #[tracing::instrument(skip(self, segments), fields(segments = segments.len()))]
    async fn concat(&self, segments: &[PathBuf], destination: &Path) -> ReelResult<PathBuf> {
        if segments.is_empty() {
            return Err(media_error("No segments to concatenate".to_string()));
        }
        ensure_parent(destination).await?;
        let list = destination.with_extension("txt");
        let mut body = String::new();
        for segment in segments {
            let absolute = std::path::absolute(segment).unwrap_or_else(|_| segment.clone());
            body.push_str(&format!(
                "file '{}'\n",
                absolute.to_string_lossy().replace('\'', "'\\''")
            ));
        }
        tokio::fs::write(&list, body).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", list.display(), e)))
        })?;

        // Segments come from different sources; re-encode instead of `-c copy`.
        produce_atomically(destination, |staging| async move {
            self.ffmpeg(vec![
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
                "-i".to_string(),
                path_arg(&list),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                path_arg(&staging),
            ])
            .await
        })
        .await?;
        tracing::info!(destination = %destination.display(), "Final video assembled");
        Ok(destination.to_path_buf())
    }
}
