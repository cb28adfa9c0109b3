//! Talking-head style: presenter avatar reading the narration.

use crate::dispatcher::{GenerationDispatcher, SceneContext};
use crate::wait_for_task;
use reel_core::ScenePlan;
use reel_error::ReelResult;
use reel_storage::ArtifactKind;
use std::path::PathBuf;

impl GenerationDispatcher {
    /// The avatar service needs the narration by URL, so the URL is kept
    /// next to the audio and reused on later runs.
    pub(crate) async fn talking_head(&self, ctx: &SceneContext<'_>, plan: &ScenePlan) -> ReelResult<PathBuf> {
        let audio_url = self.narration_url(ctx, plan).await?;
        let audio = ArtifactKind::Audio(ctx.index);
        if ctx.cached(&audio).await.is_none() {
            let destination = ctx.store.prepare(&audio).await?;
            self.services.downloader().download(&audio_url, &destination).await?;
        }

        let avatar = self.services.talking_head();
        let task_id = avatar.create_task(&audio_url, plan.audio_content()).await?;
        tracing::info!(%task_id, "Submitted talking-head task");
        let url = wait_for_task(
            &task_id,
            self.config.poll_interval(),
            self.config.task_timeout(),
            || avatar.poll(&task_id),
        )
        .await?;

        let destination = ctx.store.prepare(&ArtifactKind::Segment(ctx.index)).await?;
        self.services.downloader().download(&url, &destination).await
    }

    async fn narration_url(&self, ctx: &SceneContext<'_>, plan: &ScenePlan) -> ReelResult<String> {
        let kind = ArtifactKind::AudioUrl(ctx.index);
        if let Some(url) = ctx.store.load_json::<String>(&kind).await? {
            tracing::debug!(%url, "Reusing synthesized narration");
            return Ok(url);
        }
        let url = self.services.speech().synthesize(plan.audio_content()).await?;
        ctx.store.save_json(&kind, &url).await?;
        Ok(url)
    }
}
