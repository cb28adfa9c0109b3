//! Slides style: a figure or table from the document under a caption.

use crate::dispatcher::{GenerationDispatcher, SceneContext};
use crate::prompts;
use reel_core::{Attachments, PlanField, ScenePlan, Style, extract_structured};
use reel_error::{GenerationError, GenerationErrorKind, ReelResult};
use reel_interface::{AssetKind, SchemaCheck};
use reel_storage::ArtifactKind;
use serde_json::Value;
use std::path::PathBuf;

impl GenerationDispatcher {
    pub(crate) async fn slides(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let audio = self.ensure_audio(ctx, plan.audio_content()).await?;
        let slide = match ctx.cached(&ArtifactKind::Image(ctx.index)).await {
            Some(path) => path,
            None => self.compose_slide(ctx, plan).await?,
        };
        self.finish_still(ctx, plan, &slide, &audio).await
    }

    /// Lift the source asset, refine the caption until the evaluator
    /// accepts it, then lay both out as a slide.
    async fn compose_slide(&self, ctx: &SceneContext<'_>, plan: &mut ScenePlan) -> ReelResult<PathBuf> {
        let asset = match ctx.cached(&ArtifactKind::DocumentAsset(ctx.index)).await {
            Some(path) => path,
            None => self.locate_asset(ctx, plan).await?,
        };

        let with_document = Attachments::none().with_document(ctx.document.clone());
        let budget = (*self.config.max_generate_iterations()).max(1);
        let mut attempt = 0;
        loop {
            let verdict = self.judge(Style::Slides, plan, vec![asset.clone()]).await?;
            attempt += 1;
            if verdict.accepted {
                break;
            }
            if attempt >= budget {
                tracing::warn!(attempts = attempt, "Caption budget exhausted, keeping the last caption");
                break;
            }
            let caption = self
                .services
                .planner()
                .invoke(
                    &prompts::refine_caption(&verdict.feedback, plan.prompt()),
                    &with_document,
                    None,
                )
                .await?;
            plan.set_field(PlanField::Prompt, caption.trim());
        }

        let destination = ctx.store.prepare(&ArtifactKind::Image(ctx.index)).await?;
        self.services
            .composer()
            .compose_slide(&asset, plan.prompt(), &destination)
            .await
    }

    async fn locate_asset(&self, ctx: &SceneContext<'_>, plan: &ScenePlan) -> ReelResult<PathBuf> {
        let check: &SchemaCheck = &|value: &Value| {
            locator(value)
                .map(|_| ())
                .ok_or_else(|| "expected {\"type\": ..., \"number\": ...}".to_string())
        };
        let reply = self
            .services
            .planner()
            .invoke(
                &prompts::locate_source(plan.source()),
                &Attachments::none().with_document(ctx.document.clone()),
                Some(check),
            )
            .await?;
        let (kind, number) = locator(&extract_structured(&reply)?).ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::MissingAsset(plan.source().clone()))
        })?;
        tracing::info!(%kind, number, source = %plan.source(), "Located document asset");

        let destination = ctx.store.prepare(&ArtifactKind::DocumentAsset(ctx.index)).await?;
        self.services
            .documents()
            .locate(ctx.document, kind, number, &destination)
            .await
    }
}

/// Reads `{"type": "TABLE" | "IMAGE", "number": 2}`; the number may be a
/// string such as "Table 2".
fn locator(value: &Value) -> Option<(AssetKind, u32)> {
    let kind = AssetKind::from_locator(value.get("type")?.as_str()?);
    let number = match value.get("number")? {
        Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
        Value::String(text) => {
            let digits: String = text
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    Some((kind, number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locator_reads_numbers_and_labels() {
        assert_eq!(
            locator(&json!({"type": "TABLE", "number": 2})),
            Some((AssetKind::Table, 2))
        );
        assert_eq!(
            locator(&json!({"type": "IMAGE", "number": "Fig. 3"})),
            Some((AssetKind::Figure, 3))
        );
        assert_eq!(locator(&json!({"type": "IMAGE"})), None);
        assert_eq!(locator(&json!({"number": 1})), None);
    }
}
