//! General style: generated video clip.

use crate::dispatcher::{GenerationDispatcher, SceneContext};
use crate::prompts;
use reel_core::{Attachments, PlanField, ScenePlan, Style};
use reel_error::ReelResult;
use reel_interface::MediaTaskRequest;
use reel_storage::ArtifactKind;
use std::path::PathBuf;

impl GenerationDispatcher {
    pub(crate) async fn general(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let audio = self.ensure_audio(ctx, plan.audio_content()).await?;
        let video = self.accepted_video(ctx, plan).await?;
        self.finish_video(ctx, plan, &video, &audio).await
    }

    /// Generate and judge clips until one is accepted or the budget runs
    /// out, then keep the last one.
    async fn accepted_video(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let accepted = ArtifactKind::Video(ctx.index);
        if let Some(path) = ctx.cached(&accepted).await {
            return Ok(path);
        }

        let budget = (*self.config.max_generate_iterations()).max(1);
        let mut feedback: Option<String> = None;
        let mut attempt = 0;
        loop {
            let candidate = ArtifactKind::VideoCandidate {
                scene: ctx.index,
                attempt,
            };
            let path = match ctx.cached(&candidate).await {
                Some(path) => path,
                None => {
                    let request = match &feedback {
                        None => prompts::video_prompt(plan.prompt()),
                        Some(feedback) => prompts::refine_prompt(feedback, plan.prompt()),
                    };
                    let prompt = self
                        .services
                        .artist()
                        .invoke(&request, &Attachments::none(), None)
                        .await?;
                    plan.set_field(PlanField::Prompt, prompt.trim());
                    let url = self.run_task(MediaTaskRequest::video(plan.prompt().as_str())).await?;
                    let destination = ctx.store.prepare(&candidate).await?;
                    self.services.downloader().download(&url, &destination).await?
                }
            };

            let frames = self.key_frames(ctx, &path).await?;
            let verdict = self.judge(Style::General, plan, frames).await?;
            attempt += 1;
            if verdict.accepted || attempt >= budget {
                if !verdict.accepted {
                    tracing::warn!(attempts = attempt, "Video budget exhausted, keeping the last clip");
                }
                return ctx.store.adopt(&path, &accepted).await;
            }
            feedback = Some(verdict.feedback);
        }
    }
}
