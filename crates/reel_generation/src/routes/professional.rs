//! Professional style: mathematical animation or molecule turntable.

use crate::dispatcher::{GenerationDispatcher, SceneContext};
use crate::{check_code, prompts};
use reel_core::{Attachments, PlanField, ProfessionalKind, ScenePlan, Style, extract_code};
use reel_error::{GenerationError, GenerationErrorKind, ReelResult};
use reel_interface::LanguageModel;
use reel_storage::ArtifactKind;
use std::path::PathBuf;

impl GenerationDispatcher {
    pub(crate) async fn professional(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let visual = ArtifactKind::Video(ctx.index);
        if ctx.cached(&visual).await.is_none() {
            let answer = self
                .services
                .evaluator()
                .invoke(
                    &format!(
                        "{}\n{}\n{}",
                        prompts::PROFESSIONAL_CLASSIFY,
                        plan.scenario(),
                        plan.prompt()
                    ),
                    &Attachments::none(),
                    None,
                )
                .await?;
            let kind = ProfessionalKind::from_answer(&answer);
            tracing::info!(%kind, "Classified professional scene");
            match kind {
                ProfessionalKind::Math => self.math(ctx, plan).await?,
                ProfessionalKind::Molecule => self.molecule(ctx, plan).await?,
            }
        }

        let audio = self.ensure_audio(ctx, plan.audio_content()).await?;
        self.finish_video(ctx, plan, &ctx.store.path(&visual), &audio)
            .await
    }

    /// Write, render and judge animation code until a render is accepted
    /// or the budget runs out.
    async fn math(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<()> {
        let artist = self.services.artist().as_ref();
        let none = Attachments::none();

        let caption = artist
            .invoke(&format!("{}\n{}", prompts::CAPTION_REWRITE, plan.prompt()), &none, None)
            .await?;
        plan.set_field(PlanField::Prompt, caption.trim());

        let examples = self
            .examples
            .as_ref()
            .map(|examples| examples.animation_text())
            .unwrap_or_default();
        let mut raw = artist
            .invoke(
                &prompts::animation_request(plan.source(), plan.prompt(), &examples),
                &none,
                None,
            )
            .await?;

        let budget = (*self.config.max_generate_iterations()).max(1);
        let mut attempt = 0;
        loop {
            let code = self.conform(raw, artist).await?;
            let candidate = ArtifactKind::VideoCandidate {
                scene: ctx.index,
                attempt,
            };
            let (code, video) = self.render_with_repair(ctx, plan, code, &candidate).await?;
            let frames = self.key_frames(ctx, &video).await?;
            let verdict = self.judge(Style::Professional, plan, frames).await?;
            attempt += 1;
            if verdict.accepted || attempt >= budget {
                if !verdict.accepted {
                    tracing::warn!(attempts = attempt, "Animation budget exhausted, keeping the last render");
                }
                ctx.store.adopt(&video, &ArtifactKind::Video(ctx.index)).await?;
                return Ok(());
            }
            raw = artist
                .invoke(&format!("{}\n{}", verdict.feedback, code), &none, None)
                .await?;
        }
    }

    /// Pull the animation method out of a reply and have `model` repair it
    /// until it meets the code contract. Code that still breaks the
    /// contract after the repair budget is returned as is and left to the
    /// renderer.
    async fn conform(&self, raw: String, model: &dyn LanguageModel) -> ReelResult<String> {
        let mut code = extract_code(&raw).unwrap_or_else(|| raw.trim().to_string());
        let mut repairs = 0;
        while let Err(problems) = check_code(&code) {
            if repairs >= *self.config.max_render_repairs() {
                tracing::warn!(%problems, "Animation code still breaks its contract");
                break;
            }
            repairs += 1;
            tracing::debug!(repairs, %problems, "Requesting code format repair");
            let reply = model
                .invoke(
                    &format!("{}\n{}", prompts::CODE_FORMAT, code),
                    &Attachments::none(),
                    None,
                )
                .await?;
            code = extract_code(&reply).unwrap_or_else(|| reply.trim().to_string());
        }
        Ok(code)
    }

    /// Render `code`, asking the evaluator to repair it after each render
    /// error. Returns the code that rendered and the video.
    async fn render_with_repair(
        &self,
        ctx: &SceneContext<'_>,
        plan: &ScenePlan,
        mut code: String,
        candidate: &ArtifactKind,
    ) -> ReelResult<(String, PathBuf)> {
        let evaluator = self.services.evaluator().as_ref();
        let mut repairs = 0;
        loop {
            ctx.store
                .save_text(&ArtifactKind::AnimationCode(ctx.index), &code)
                .await?;
            let destination = ctx.store.prepare(candidate).await?;
            let error = match self
                .services
                .animator()
                .render(&code, plan.scenario(), plan.audio_content(), &destination)
                .await
            {
                Ok(video) => return Ok((code, video)),
                Err(e) => e.to_string(),
            };

            if repairs >= *self.config.max_render_repairs() {
                return Err(GenerationError::new(GenerationErrorKind::RenderExhausted {
                    attempts: repairs,
                    last: error,
                })
                .into());
            }
            repairs += 1;
            tracing::warn!(repairs, %error, "Animation failed to render, repairing code");
            let reply = evaluator
                .invoke(
                    &prompts::repair_code(&code, plan.prompt(), &error),
                    &Attachments::none(),
                    None,
                )
                .await?;
            code = self.conform(reply, evaluator).await?;
        }
    }

    /// Resolve the scene's molecule, fetch its structure and render a
    /// turntable. No structure match means a person has to supply one.
    async fn molecule(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<()> {
        let evaluator = self.services.evaluator();
        let none = Attachments::none();

        let reply = evaluator
            .invoke(&prompts::molecule_name(plan.source(), plan.prompt()), &none, None)
            .await?;
        let name = reply.trim().trim_matches(['"', '\'', '.']).to_string();

        let narration = evaluator
            .invoke(&prompts::molecule_narration(plan.audio_content(), &name), &none, None)
            .await?;
        plan.set_field(PlanField::AudioContent, narration.trim());

        let ids = self.services.structures().resolve(&name).await?;
        let Some(id) = ids.first() else {
            tracing::warn!(%name, "No structure found, manual intervention required");
            return Err(GenerationError::new(GenerationErrorKind::ManualIntervention(name)).into());
        };
        tracing::info!(%name, %id, "Resolved molecule structure");

        let kind = ArtifactKind::Structure {
            scene: ctx.index,
            id: id.to_lowercase(),
        };
        let structure = match ctx.cached(&kind).await {
            Some(path) => path,
            None => {
                let destination = ctx.store.prepare(&kind).await?;
                self.services.structures().fetch(id, &destination).await?
            }
        };

        let destination = ctx.store.prepare(&ArtifactKind::Video(ctx.index)).await?;
        self.services
            .molecules()
            .render_turntable(&structure, &destination)
            .await?;
        Ok(())
    }
}
