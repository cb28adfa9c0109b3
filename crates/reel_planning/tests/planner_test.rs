// Tests for the field-gated scene planner.

mod test_utils;

use reel_core::{DocumentRef, PlanField, SceneDescriptor};
use reel_planning::{PlanningConfig, ScenePlanner, prompts};
use reel_storage::{ArtifactKind, ArtifactStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use test_utils::MockModel;

const SLIDES_PLAN: &str = r#"{"audio_content": "This figure shows the full pipeline.", "style": "Slides", "source": "Fig.1", "prompt": "Pipeline overview"}"#;

fn scene() -> SceneDescriptor {
    SceneDescriptor::new("Method", "How the pipeline plans scenes", "10 seconds")
}

/// Planner that drafts free text and formats it as `formatted(draft)`.
fn planner(formatted: impl Fn(usize) -> String + Send + Sync + 'static) -> MockModel {
    let drafts = AtomicUsize::new(0);
    MockModel::new("planner", move |prompt, _| {
        if prompt.ends_with(prompts::LOW_PLAN_FORMAT) {
            formatted(drafts.load(Ordering::SeqCst))
        } else {
            drafts.fetch_add(1, Ordering::SeqCst);
            "Use the pipeline figure as a slide and narrate it.".to_string()
        }
    })
}

async fn store(dir: &tempfile::TempDir) -> anyhow::Result<(ArtifactStore, DocumentRef)> {
    let document = DocumentRef::new("papers/attention.pdf");
    let store = ArtifactStore::open(dir.path(), document.id()).await?;
    Ok((store, document))
}

#[tokio::test]
async fn test_accepting_evaluator_passes_four_gates_in_one_draft() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner(|_| SLIDES_PLAN.to_string()));
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES"));

    let planning = ScenePlanner::new(planner.clone(), evaluator.clone(), PlanningConfig::default())
        .plan_scene(&store, &document, 0, &scene())
        .await?;

    assert_eq!(*planning.drafts(), 1);
    assert_eq!(*planning.evaluations(), 4);
    assert!(*planning.accepted());
    assert_eq!(planner.call_count(), 2);
    assert_eq!(evaluator.call_count(), 4);

    let plan = planning.plan();
    assert_eq!(plan.style(), "Slides");
    assert_eq!(plan.source(), "Fig.1");
    assert_eq!(plan.scenario(), "How the pipeline plans scenes");
    assert_eq!(plan.time_cost(), "10 seconds");

    let questions: Vec<_> = evaluator.prompts();
    assert!(questions[0].contains(prompts::field_question(PlanField::Style)));
    assert!(questions[3].contains(prompts::field_question(PlanField::Prompt)));
    assert!(store.exists(&ArtifactKind::ScenePlan(0)).await);
    Ok(())
}

#[tokio::test]
async fn test_rejected_source_regenerates_twice() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    // Each draft cites a different source and retitles the style; the
    // committed style must survive.
    let planner = Arc::new(planner(|draft| {
        let style = if draft == 1 { "Slides" } else { "Captioning" };
        format!(
            r#"{{"audio_content": "Narration {draft}", "style": "{style}", "source": "Table {draft}", "prompt": "Pipeline overview"}}"#
        )
    }));
    let rejections = AtomicUsize::new(0);
    let evaluator = Arc::new(MockModel::new("evaluator", move |prompt, _| {
        if prompt.contains(prompts::field_question(PlanField::Source))
            && rejections.fetch_add(1, Ordering::SeqCst) < 2
        {
            "NO, cite the exact figure".to_string()
        } else {
            "YES".to_string()
        }
    }));

    let planning = ScenePlanner::new(planner.clone(), evaluator.clone(), PlanningConfig::default())
        .plan_scene(&store, &document, 1, &scene())
        .await?;

    assert_eq!(*planning.drafts(), 3);
    assert_eq!(planner.call_count(), 6);
    // style + audio + source on the first draft, source on the second,
    // source + prompt on the third
    assert_eq!(*planning.evaluations(), 6);
    assert!(*planning.accepted());

    let plan = planning.plan();
    assert_eq!(plan.source(), "Table 3");
    assert_eq!(plan.style(), "Slides");
    assert_eq!(plan.audio_content(), "Narration 1");

    let redraft = &planner.prompts()[2];
    assert!(redraft.contains(prompts::LOW_REPLAN));
    assert!(redraft.contains("cite the exact figure"));
    Ok(())
}

#[tokio::test]
async fn test_cached_plan_makes_no_calls() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let first = ScenePlanner::new(
        Arc::new(planner(|_| SLIDES_PLAN.to_string())),
        Arc::new(MockModel::constant("evaluator", "YES")),
        PlanningConfig::default(),
    )
    .plan_scene(&store, &document, 0, &scene())
    .await?;

    let planner = Arc::new(planner(|_| SLIDES_PLAN.to_string()));
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES"));
    let second = ScenePlanner::new(planner.clone(), evaluator.clone(), PlanningConfig::default())
        .plan_scene(&store, &document, 0, &scene())
        .await?;

    assert!(*second.from_cache());
    assert_eq!(second.plan(), first.plan());
    assert_eq!(planner.call_count() + evaluator.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_budget_exhaustion_keeps_last_plan() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner(|_| SLIDES_PLAN.to_string()));
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO, wrong style"));
    let config = PlanningConfig::default().with_max_low_iterations(4);

    let planning = ScenePlanner::new(planner.clone(), evaluator.clone(), config)
        .plan_scene(&store, &document, 2, &scene())
        .await?;

    assert_eq!(*planning.drafts(), 4);
    assert_eq!(*planning.evaluations(), 4);
    assert!(!*planning.accepted());
    assert_eq!(planning.plan().style(), "Slides");
    assert!(store.exists(&ArtifactKind::ScenePlan(2)).await);
    Ok(())
}

#[tokio::test]
async fn test_without_reflection_single_draft_is_accepted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner(|_| format!("Sure!\n```json\n{}\n```", SLIDES_PLAN)));
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO"));
    let config = PlanningConfig::default().with_reflection(false);

    let planning = ScenePlanner::new(planner.clone(), evaluator.clone(), config)
        .plan_scene(&store, &document, 0, &scene())
        .await?;

    assert_eq!(*planning.drafts(), 1);
    assert_eq!(evaluator.call_count(), 0);
    assert!(*planning.accepted());
    assert_eq!(planning.plan().prompt(), "Pipeline overview");
    Ok(())
}

#[tokio::test]
async fn test_nested_source_survives_field_reextraction() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner(|_| {
        r#"{"audio_content": "The table compares both encoders.", "style": "Slides", "source": {"type": "TABLE", "locator": {"page": 4, "number": 2}}, "prompt": "Encoder comparison"}"#
            .to_string()
    }));
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES"));

    let planning = ScenePlanner::new(planner, evaluator, PlanningConfig::default())
        .plan_scene(&store, &document, 0, &scene())
        .await?;

    let source: serde_json::Value = serde_json::from_str(planning.plan().source())?;
    assert_eq!(
        source,
        serde_json::json!({"type": "TABLE", "locator": {"page": 4, "number": 2}})
    );
    assert_eq!(planning.plan().prompt(), "Encoder comparison");
    Ok(())
}
