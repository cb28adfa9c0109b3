//! PyMOL turntable clips.

use super::{produce_atomically, run_tool};
use async_trait::async_trait;
use reel_error::{ReelResult, StorageError, StorageErrorKind};
use reel_interface::MoleculeRenderer;
use std::path::{Path, PathBuf};

/// Renders structures frame by frame with PyMOL and encodes them with ffmpeg.
pub struct PymolRenderer {
    pymol: String,
    ffmpeg: String,
    frames: u32,
    fps: u32,
}

impl PymolRenderer {
    /// Renderer producing `frames` frames played at `fps`.
    pub fn new(pymol: &str, ffmpeg: &str, frames: u32, fps: u32) -> Self {
        Self {
            pymol: pymol.to_string(),
            ffmpeg: ffmpeg.to_string(),
            frames: frames.max(1),
            fps: fps.max(1),
        }
    }
}

/// PyMOL script writing a half-turn around the y axis as numbered PNGs.
fn turntable_script(structure: &Path, frame_dir: &Path, frames: u32) -> String {
    let quote = |path: &Path| serde_json::Value::String(path.to_string_lossy().into_owned()).to_string();
    format!(
        r#"import os
from pymol import cmd

cmd.reinitialize()
cmd.load({structure})
cmd.bg_color("white")
cmd.color("marine", "all")
cmd.hide("everything")
cmd.show("sticks")
cmd.show("spheres", "elem C")
cmd.zoom("all", 2)
frames = {frames}
for i in range(frames):
    if i:
        cmd.turn("y", 180.0 / frames)
    cmd.png(os.path.join({frame_dir}, "frame%04d.png" % i), width=1280, height=720, dpi=150, ray=0)
cmd.quit()
"#,
        structure = quote(structure),
        frame_dir = quote(frame_dir),
    )
}

#[async_trait]
impl MoleculeRenderer for PymolRenderer {
    #[tracing::instrument(skip(self), fields(structure = %structure.display()))]
    async fn render_turntable(&self, structure: &Path, destination: &Path) -> ReelResult<PathBuf> {
        let frame_dir = destination.with_extension("frames");
        tokio::fs::create_dir_all(&frame_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                frame_dir.display(),
                e
            )))
        })?;
        let script = frame_dir.join("turntable.py");
        tokio::fs::write(&script, turntable_script(structure, &frame_dir, self.frames))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    script.display(),
                    e
                )))
            })?;

        run_tool(&self.pymol, ["-cq".to_string(), script.to_string_lossy().into_owned()]).await?;
        let frames = frame_dir.join("frame%04d.png");
        let path = produce_atomically(destination, |staging| async move {
            run_tool(
                &self.ffmpeg,
                [
                    "-y".to_string(),
                    "-loglevel".to_string(),
                    "error".to_string(),
                    "-framerate".to_string(),
                    self.fps.to_string(),
                    "-i".to_string(),
                    frames.to_string_lossy().into_owned(),
                    "-c:v".to_string(),
                    "libx264".to_string(),
                    "-pix_fmt".to_string(),
                    "yuv420p".to_string(),
                    staging.to_string_lossy().into_owned(),
                ],
            )
            .await
            .map(|_| ())
        })
        .await?;
        tracing::info!(frames = self.frames, "Turntable rendered");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_loads_structure_and_turns_evenly() {
        let script = turntable_script(Path::new("/w/scene2/4hhb.pdb"), Path::new("/w/scene2/video.frames"), 60);
        assert!(script.contains(r#"cmd.load("/w/scene2/4hhb.pdb")"#));
        assert!(script.contains("frames = 60"));
        assert!(script.contains(r#"cmd.color("marine", "all")"#));
        assert!(script.contains(r#"os.path.join("/w/scene2/video.frames", "frame%04d.png" % i)"#));
    }
}
