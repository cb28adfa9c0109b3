//! Manim rendering of generated `animate` methods.

use super::{run_tool, wrap};
use async_trait::async_trait;
use reel_error::{GenerationError, GenerationErrorKind, ReelResult, StorageError, StorageErrorKind};
use reel_interface::AnimationRenderer;
use std::path::{Path, PathBuf};

const SCENE_CLASS: &str = "ReelScene";
const SCRIPT_NAME: &str = "reel_scene.py";
const OUTPUT_NAME: &str = "scene.mp4";
/// Narration column width in characters.
const NARRATION_WIDTH: usize = 20;

/// Renders animation code inside a scene that shows the title and narration.
pub struct ManimRenderer {
    manim: String,
}

impl ManimRenderer {
    /// Renderer calling the given manim executable.
    pub fn new(manim: &str) -> Self {
        Self {
            manim: manim.to_string(),
        }
    }
}

/// Python string literal for `text`; JSON string syntax is valid Python.
fn py_str(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Full manim script with `code` as the scene's `animate` method.
fn scene_script(code: &str, scenario: &str, narration: &str) -> String {
    let lines: Vec<String> = wrap(narration, NARRATION_WIDTH)
        .iter()
        .map(|line| py_str(line))
        .collect();
    let method: String = code
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                "\n".to_string()
            } else {
                format!("    {}\n", line)
            }
        })
        .collect();

    format!(
        r#"from manim import *
import numpy as np


class {SCENE_CLASS}(Scene):
    def construct(self):
        title = Text({title}, font_size=36).to_edge(UP)
        self.play(FadeIn(title))

        col_width = config.frame_width / 3
        lines = [{lines}]
        if lines:
            font = 80
            ruler = Text("A" * {NARRATION_WIDTH}, font_size=font)
            while font > 10 and ruler.width > col_width - 0.4:
                font -= 2
                ruler = Text("A" * {NARRATION_WIDTH}, font_size=font)
            paragraph = Paragraph(*lines, font_size=font, line_spacing=1.3, alignment="center")
            paragraph.move_to(RIGHT * (config.frame_width / 3))
            self.play(FadeIn(paragraph))

        self.animate()

{method}"#,
        title = py_str(scenario),
        lines = lines.join(", "),
    )
}

#[async_trait]
impl AnimationRenderer for ManimRenderer {
    #[tracing::instrument(skip(self, code, narration), fields(destination = %destination.display()))]
    async fn render(
        &self,
        code: &str,
        scenario: &str,
        narration: &str,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        let work_dir = destination.with_extension("manim");
        tokio::fs::create_dir_all(&work_dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                work_dir.display(),
                e
            )))
        })?;
        let script = work_dir.join(SCRIPT_NAME);
        tokio::fs::write(&script, scene_script(code, scenario, narration))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    script.display(),
                    e
                )))
            })?;

        // Render errors carry manim's traceback, which feeds the repair prompt.
        run_tool(
            &self.manim,
            [
                "-qm".to_string(),
                "--disable_caching".to_string(),
                "--media_dir".to_string(),
                work_dir.to_string_lossy().into_owned(),
                "-o".to_string(),
                OUTPUT_NAME.to_string(),
                script.to_string_lossy().into_owned(),
                SCENE_CLASS.to_string(),
            ],
        )
        .await?;

        let stem = SCRIPT_NAME.trim_end_matches(".py");
        let rendered = work_dir
            .join("videos")
            .join(stem)
            .join("720p30")
            .join(OUTPUT_NAME);
        if !tokio::fs::try_exists(&rendered).await.unwrap_or(false) {
            return Err(GenerationError::new(GenerationErrorKind::Media(format!(
                "manim finished without writing {}",
                rendered.display()
            )))
            .into());
        }
        tokio::fs::rename(&rendered, destination).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                destination.display(),
                e
            )))
        })?;
        tracing::debug!("Animation rendered");
        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_method_inside_scene() {
        let code = "def animate(self):\n    self.play(Create(Circle()))\n\n    self.wait(2)";
        let script = scene_script(code, "Attention \"heads\"", "Each head attends to a different subspace");
        assert!(script.contains("class ReelScene(Scene):"));
        assert!(script.contains("    def animate(self):\n        self.play(Create(Circle()))\n\n        self.wait(2)\n"));
        assert!(script.contains(r#"Text("Attention \"heads\"", font_size=36)"#));
        assert!(script.contains(r#""Each head attends to", "a different subspace""#));
    }

    #[test]
    fn empty_narration_skips_paragraph_lines() {
        let script = scene_script("def animate(self):\n    self.wait(1)", "T", "");
        assert!(script.contains("lines = []"));
    }
}
