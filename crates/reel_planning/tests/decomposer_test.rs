// Tests for high-level scene decomposition.

mod test_utils;

use reel_core::DocumentRef;
use reel_error::{PlanningErrorKind, ReelErrorKind};
use reel_planning::{PlanOrigin, PlanningConfig, SceneDecomposer, prompts};
use reel_storage::{ArtifactKind, ArtifactStore};
use std::sync::Arc;
use test_utils::MockModel;

const SCENE_LIST: &str = r#"Here is the list:
```json
[
  {"SCENE1": "Opening", "DESCRIPTION": "Why long documents are hard to skim", "TIME_ALLOCATION": "8 seconds"},
  {"SCENE2": "Method", "DESCRIPTION": "How the pipeline plans scenes", "TIME_ALLOCATION": "10 seconds"},
  {"SCENE3": "Results", "DESCRIPTION": "What the evaluation shows", "TIME_ALLOCATION": "6 seconds"}
]
```"#;

fn planner() -> MockModel {
    MockModel::new("planner", |prompt, _| {
        if prompt.starts_with(prompts::HIGH_PLAN_FORMAT) {
            SCENE_LIST.to_string()
        } else {
            "Scene one opens with the problem, scene two explains the method...".to_string()
        }
    })
}

async fn store(dir: &tempfile::TempDir) -> anyhow::Result<(ArtifactStore, DocumentRef)> {
    let document = DocumentRef::new("papers/attention.pdf");
    let store = ArtifactStore::open(dir.path(), document.id()).await?;
    Ok((store, document))
}

#[tokio::test]
async fn test_accepting_evaluator_finishes_in_one_iteration() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner());
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES, the story is coherent."));

    let decomposer = SceneDecomposer::new(planner.clone(), evaluator.clone(), PlanningConfig::default());
    let decomposition = decomposer.decompose(&store, &document).await?;

    assert_eq!(*decomposition.iterations(), 1);
    assert!(*decomposition.accepted());
    assert_eq!(*decomposition.origin(), PlanOrigin::Generated);
    assert_eq!(decomposition.scenes().len(), 3);
    assert_eq!(decomposition.scenes()[1].label(), "Method");
    assert_eq!(planner.call_count(), 2);
    assert_eq!(evaluator.call_count(), 1);
    assert!(store.exists(&ArtifactKind::HighPlan).await);
    Ok(())
}

#[tokio::test]
async fn test_persisted_plan_is_reused_without_model_calls() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let first = SceneDecomposer::new(
        Arc::new(planner()),
        Arc::new(MockModel::constant("evaluator", "YES")),
        PlanningConfig::default(),
    )
    .decompose(&store, &document)
    .await?;

    let planner = Arc::new(planner());
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES"));
    let second = SceneDecomposer::new(planner.clone(), evaluator.clone(), PlanningConfig::default())
        .decompose(&store, &document)
        .await?;

    assert_eq!(*second.origin(), PlanOrigin::Cached);
    assert_eq!(second.scenes(), first.scenes());
    assert_eq!(planner.call_count(), 0);
    assert_eq!(evaluator.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_rejections_are_bounded_and_feed_back() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner());
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO. Scenes 2 and 3 overlap."));
    let config = PlanningConfig::default().with_max_high_iterations(3);

    let decomposition = SceneDecomposer::new(planner.clone(), evaluator.clone(), config)
        .decompose(&store, &document)
        .await?;

    assert_eq!(*decomposition.iterations(), 3);
    assert!(!*decomposition.accepted());
    assert_eq!(decomposition.scenes().len(), 3);
    assert_eq!(evaluator.call_count(), 3);
    assert_eq!(planner.call_count(), 6);

    let redraft = &planner.prompts()[2];
    assert!(redraft.contains(prompts::HIGH_REPLAN));
    assert!(redraft.contains("Scenes 2 and 3 overlap"));
    Ok(())
}

#[tokio::test]
async fn test_without_reflection_skips_evaluation() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner());
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO"));
    let config = PlanningConfig::default().with_reflection(false);

    let decomposition = SceneDecomposer::new(planner.clone(), evaluator.clone(), config)
        .decompose(&store, &document)
        .await?;

    assert!(*decomposition.accepted());
    assert_eq!(planner.call_count(), 2);
    assert_eq!(evaluator.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unformattable_plan_has_no_scenes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(MockModel::constant("planner", "I could not read the paper."));
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO"));
    let config = PlanningConfig::default().with_max_high_iterations(2);

    let err = SceneDecomposer::new(planner, evaluator.clone(), config)
        .decompose(&store, &document)
        .await
        .unwrap_err();

    match err.kind() {
        ReelErrorKind::Planning(e) => assert_eq!(e.kind, PlanningErrorKind::NoScenes),
        other => panic!("expected planning error, got {other}"),
    }
    assert_eq!(evaluator.call_count(), 2);
    assert!(!store.exists(&ArtifactKind::HighPlan).await);
    Ok(())
}

#[tokio::test]
async fn test_supplied_plan_is_adopted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let planner = Arc::new(planner());
    let decomposer = SceneDecomposer::new(
        planner.clone(),
        Arc::new(MockModel::constant("evaluator", "YES")),
        PlanningConfig::default(),
    );

    let adopted = decomposer.adopt(&store, SCENE_LIST).await?;
    assert_eq!(*adopted.origin(), PlanOrigin::Supplied);
    assert_eq!(adopted.scenes().len(), 3);

    let reused = decomposer.decompose(&store, &document).await?;
    assert_eq!(*reused.origin(), PlanOrigin::Cached);
    assert_eq!(planner.call_count(), 0);
    Ok(())
}
