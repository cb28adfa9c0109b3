//! Captioning style: generated still image.

use crate::dispatcher::{GenerationDispatcher, SceneContext};
use crate::prompts;
use reel_core::{Attachments, PlanField, ScenePlan, Style};
use reel_error::ReelResult;
use reel_interface::MediaTaskRequest;
use reel_storage::ArtifactKind;
use std::path::PathBuf;

impl GenerationDispatcher {
    pub(crate) async fn captioning(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let audio = self.ensure_audio(ctx, plan.audio_content()).await?;
        let image = self.accepted_image(ctx, plan).await?;
        self.finish_still(ctx, plan, &image, &audio).await
    }

    async fn accepted_image(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let accepted = ArtifactKind::Image(ctx.index);
        if let Some(path) = ctx.cached(&accepted).await {
            return Ok(path);
        }

        let budget = (*self.config.max_generate_iterations()).max(1);
        let mut feedback: Option<String> = None;
        let mut attempt = 0;
        loop {
            let candidate = ArtifactKind::ImageCandidate {
                scene: ctx.index,
                attempt,
            };
            let path = match ctx.cached(&candidate).await {
                Some(path) => path,
                None => {
                    let request = match &feedback {
                        None => prompts::image_prompt(plan.scenario(), plan.prompt()),
                        Some(feedback) => prompts::refine_prompt(feedback, plan.prompt()),
                    };
                    let prompt = self
                        .services
                        .artist()
                        .invoke(&request, &Attachments::none(), None)
                        .await?;
                    plan.set_field(PlanField::Prompt, prompt.trim());
                    let url = self.run_task(MediaTaskRequest::image(plan.prompt().as_str())).await?;
                    let destination = ctx.store.prepare(&candidate).await?;
                    self.services.downloader().download(&url, &destination).await?
                }
            };

            let verdict = self.judge(Style::Captioning, plan, vec![path.clone()]).await?;
            attempt += 1;
            if verdict.accepted || attempt >= budget {
                if !verdict.accepted {
                    tracing::warn!(attempts = attempt, "Image budget exhausted, keeping the last image");
                }
                return ctx.store.adopt(&path, &accepted).await;
            }
            feedback = Some(verdict.feedback);
        }
    }
}
