//! Style routing and the steps shared by every route.

use crate::{GenerationConfig, Services, prompts, wait_for_task};
use reel_core::{
    Alignment, Attachments, DocumentRef, MediaArtifact, ScenePlan, Segment, Style, Verdict,
    clamp_still_duration,
};
use reel_error::ReelResult;
use reel_interface::{MediaComposer, MediaTaskRequest};
use reel_planning::{ExampleLibrary, RejectionTokenClassifier, VerdictClassifier};
use reel_storage::{ArtifactKind, ArtifactStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where one scene's artifacts live.
pub(crate) struct SceneContext<'a> {
    pub(crate) store: &'a ArtifactStore,
    pub(crate) document: &'a DocumentRef,
    pub(crate) index: usize,
}

impl SceneContext<'_> {
    pub(crate) async fn cached(&self, kind: &ArtifactKind) -> Option<PathBuf> {
        if self.store.exists(kind).await {
            Some(self.store.path(kind))
        } else {
            None
        }
    }
}

/// Turns an accepted scene plan into a finished segment.
///
/// The route is chosen by the plan's style. Every route caches its visual
/// and narration by file existence, and an existing segment file skips the
/// route entirely. The plan passed in is never modified; routes that
/// rewrite prompts or narration work on a copy.
pub struct GenerationDispatcher {
    pub(crate) services: Services,
    pub(crate) config: GenerationConfig,
    pub(crate) classifier: Arc<dyn VerdictClassifier>,
    pub(crate) examples: Option<ExampleLibrary>,
}

impl GenerationDispatcher {
    /// Create a dispatcher with the default rejection-token classifier.
    pub fn new(services: Services, config: GenerationConfig) -> Self {
        Self {
            services,
            config,
            classifier: Arc::new(RejectionTokenClassifier::default()),
            examples: None,
        }
    }

    /// Use a different verdict classifier for visual checks.
    pub fn with_classifier(mut self, classifier: Arc<dyn VerdictClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Offer animation examples to the code-writing model.
    pub fn with_examples(mut self, examples: ExampleLibrary) -> Self {
        self.examples = Some(examples);
        self
    }

    /// Produce (or reuse) the segment for scene `index`.
    ///
    /// # Errors
    ///
    /// Returns error on an unknown style, a terminal model or media failure,
    /// a persistence failure, or a molecule that needs manual intervention
    /// (see [`reel_error::ReelError::is_manual_intervention`]).
    #[tracing::instrument(skip(self, store, document, plan), fields(scene = index, style = %plan.style()))]
    pub async fn generate(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
        index: usize,
        plan: &ScenePlan,
    ) -> ReelResult<Segment> {
        let kind = ArtifactKind::Segment(index);
        if store.exists(&kind).await {
            tracing::info!("Reusing existing segment");
            return Ok(Segment::cached(index, store.path(&kind)));
        }

        let style = plan.parsed_style()?;
        store.scene_dir(index).await?;
        let ctx = SceneContext {
            store,
            document,
            index,
        };
        let mut plan = plan.clone();
        tracing::info!(%style, "Generating scene");

        let path = match style {
            Style::General => self.general(&ctx, &mut plan).await?,
            Style::Professional => self.professional(&ctx, &mut plan).await?,
            Style::Slides => self.slides(&ctx, &mut plan).await?,
            Style::Captioning => self.captioning(&ctx, &mut plan).await?,
            Style::TalkingHead => self.talking_head(&ctx, &plan).await?,
        };
        tracing::info!(path = %path.display(), "Segment ready");
        Ok(Segment::produced(index, path))
    }

    /// Narration audio for the scene, synthesized once and measured.
    pub(crate) async fn ensure_audio(&self, ctx: &SceneContext<'_>, text: &str) -> ReelResult<MediaArtifact> {
        let kind = ArtifactKind::Audio(ctx.index);
        let path = match ctx.cached(&kind).await {
            Some(path) => path,
            None => {
                let url = self.services.speech().synthesize(text).await?;
                let destination = ctx.store.prepare(&kind).await?;
                self.services.downloader().download(&url, &destination).await?
            }
        };
        let seconds = self.services.composer().probe_duration(&path).await?;
        Ok(MediaArtifact::new(path).with_duration(seconds))
    }

    /// Submit a media task and wait for its result URL.
    pub(crate) async fn run_task(&self, request: MediaTaskRequest) -> ReelResult<String> {
        let media = self.services.media();
        let task_id = media.create_task(&request).await?;
        tracing::info!(%task_id, kind = %request.kind, "Submitted media task");
        wait_for_task(
            &task_id,
            self.config.poll_interval(),
            self.config.task_timeout(),
            || media.poll(&task_id),
        )
        .await
    }

    /// Frames at a quarter, half and three quarters of a video.
    pub(crate) async fn key_frames(&self, ctx: &SceneContext<'_>, video: &Path) -> ReelResult<Vec<PathBuf>> {
        let composer = self.services.composer();
        let duration = composer.probe_duration(video).await?;
        let times = [duration / 4.0, duration / 2.0, 3.0 * duration / 4.0];
        let dir = ctx.store.prepare(&ArtifactKind::Frames(ctx.index)).await?;
        composer.key_frames(video, &times, &dir).await
    }

    /// Ask the evaluator whether `images` work for the scene.
    pub(crate) async fn judge(&self, style: Style, plan: &ScenePlan, images: Vec<PathBuf>) -> ReelResult<Verdict> {
        let prompt = match style {
            Style::Professional => format!(
                "{}\n{}\n{}",
                plan.scenario(),
                plan.prompt(),
                prompts::PROFESSIONAL_VISUAL_EVAL
            ),
            Style::Slides => format!("{}\n{}", prompts::SLIDES_VISUAL_EVAL, plan.prompt()),
            Style::General | Style::Captioning | Style::TalkingHead => {
                format!("{}\n{}", prompts::GENERAL_VISUAL_EVAL, plan.prompt())
            }
        };
        let response = self
            .services
            .evaluator()
            .invoke(&prompt, &Attachments::from_images(images), None)
            .await?;
        let verdict = self.classifier.classify(&response);
        tracing::info!(accepted = verdict.accepted, "Visual verdict");
        Ok(verdict)
    }

    /// Fit `video` and `audio` to the scene's time budget and mux them into
    /// the segment.
    pub(crate) async fn finish_video(
        &self,
        ctx: &SceneContext<'_>,
        plan: &ScenePlan,
        video: &Path,
        audio: &MediaArtifact,
    ) -> ReelResult<PathBuf> {
        let composer = self.services.composer();
        let video_secs = composer.probe_duration(video).await?;
        let audio_secs = audio_seconds(composer.as_ref(), audio).await?;
        let target = self.config.time_budget(plan.time_cost());
        let alignment = Alignment::compute(video_secs, audio_secs, target);
        tracing::debug!(video_secs, audio_secs, target, ?alignment, "Aligning segment");
        let destination = ctx.store.prepare(&ArtifactKind::Segment(ctx.index)).await?;
        composer.mux(video, audio.path(), &alignment, &destination).await
    }

    /// Show a still image for the clamped time budget under its narration.
    pub(crate) async fn finish_still(
        &self,
        ctx: &SceneContext<'_>,
        plan: &ScenePlan,
        image: &Path,
        audio: &MediaArtifact,
    ) -> ReelResult<PathBuf> {
        let composer = self.services.composer();
        let seconds = clamp_still_duration(self.config.time_budget(plan.time_cost()));
        let still = ctx.store.scene_dir(ctx.index).await?.join("still.mp4");
        let video = composer.still_to_video(image, seconds, &still).await?;
        let audio_secs = audio_seconds(composer.as_ref(), audio).await?;
        let alignment = Alignment::compute(seconds, audio_secs, seconds);
        let destination = ctx.store.prepare(&ArtifactKind::Segment(ctx.index)).await?;
        composer.mux(&video, audio.path(), &alignment, &destination).await
    }
}

async fn audio_seconds(composer: &dyn MediaComposer, audio: &MediaArtifact) -> ReelResult<f64> {
    match audio.duration() {
        Some(seconds) => Ok(*seconds),
        None => composer.probe_duration(audio.path()).await,
    }
}
