// Tests for the general (text-to-video) route and segment caching.

mod test_utils;

use reel_core::{DocumentRef, ScenePlan};
use reel_error::{GenerationErrorKind, ReelErrorKind};
use reel_generation::{GenerationConfig, GenerationDispatcher, prompts};
use reel_storage::{ArtifactKind, ArtifactStore};
use std::sync::Arc;
use test_utils::{FakeServices, Fakes, MockModel};

fn plan(style: &str) -> ScenePlan {
    ScenePlan::default()
        .with_scenario("Cells split in two")
        .with_time_cost("8 seconds")
        .with_audio_content("Every cell divides to make two.")
        .with_style(style)
        .with_source("Introduction")
        .with_prompt("A cell dividing under a microscope")
}

async fn store(dir: &tempfile::TempDir) -> anyhow::Result<(ArtifactStore, DocumentRef)> {
    let document = DocumentRef::new("papers/mitosis.pdf");
    let store = ArtifactStore::open(dir.path(), document.id()).await?;
    Ok((store, document))
}

#[tokio::test]
async fn test_accepted_clip_becomes_segment_and_is_reused() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let fakes = Fakes::default();
    let planner = Arc::new(MockModel::constant("planner", "unused"));
    let artist = Arc::new(MockModel::constant("artist", "Cinematic macro shot of a dividing cell"));
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES YES YES"));
    let dispatcher = GenerationDispatcher::new(
        fakes.services(planner.clone(), artist.clone(), evaluator.clone())?,
        GenerationConfig::default(),
    );

    let segment = dispatcher.generate(&store, &document, 0, &plan("General")).await?;

    assert!(!*segment.from_cache());
    assert_eq!(segment.path(), &store.path(&ArtifactKind::Segment(0)));
    assert!(store.exists(&ArtifactKind::Video(0)).await);
    assert!(store.exists(&ArtifactKind::Audio(0)).await);

    let requests = fakes.media.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Cinematic macro shot of a dividing cell");
    assert_eq!(*fakes.composer.frame_times.lock().unwrap(), vec![vec![2.0, 4.0, 6.0]]);

    let judged = evaluator.prompts();
    assert_eq!(judged.len(), 1);
    assert!(judged[0].starts_with(prompts::GENERAL_VISUAL_EVAL));
    assert!(judged[0].ends_with("Cinematic macro shot of a dividing cell"));

    let again = dispatcher.generate(&store, &document, 0, &plan("General")).await?;
    assert!(*again.from_cache());
    assert_eq!(artist.call_count(), 1);
    assert_eq!(evaluator.call_count(), 1);
    assert_eq!(fakes.speech.texts.lock().unwrap().len(), 1);
    assert_eq!(planner.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_rejections_refine_prompt_and_keep_last_clip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let fakes = Fakes::default();
    let artist = Arc::new(MockModel::new("artist", |_, n| format!("prompt {}", n)));
    let evaluator = Arc::new(MockModel::constant("evaluator", "NO, the frames are random symbols"));
    let dispatcher = GenerationDispatcher::new(
        fakes.services(
            Arc::new(MockModel::constant("planner", "unused")),
            artist.clone(),
            evaluator.clone(),
        )?,
        GenerationConfig::default().with_max_generate_iterations(3),
    );

    dispatcher.generate(&store, &document, 0, &plan("General")).await?;

    assert_eq!(fakes.media.requests.lock().unwrap().len(), 3);
    assert_eq!(evaluator.call_count(), 3);
    let rewrites = artist.prompts();
    assert!(!rewrites[0].contains("random symbols"));
    assert!(rewrites[1].starts_with("NO, the frames are random symbols"));
    assert!(rewrites[2].contains("prompt 1"));

    let kept = std::fs::read_to_string(store.path(&ArtifactKind::Video(0)))?;
    assert_eq!(kept, "https://media.test/task-2");
    for attempt in 0..3 {
        assert!(
            store
                .exists(&ArtifactKind::VideoCandidate { scene: 0, attempt })
                .await
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_cached_candidates_are_judged_without_regenerating() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let candidate = ArtifactKind::VideoCandidate { scene: 0, attempt: 0 };
    store.save_text(&candidate, "clip from an earlier run").await?;

    let fakes = Fakes::default();
    let artist = Arc::new(MockModel::constant("artist", "unused"));
    let dispatcher = GenerationDispatcher::new(
        fakes.services(
            Arc::new(MockModel::constant("planner", "unused")),
            artist.clone(),
            Arc::new(MockModel::constant("evaluator", "YES")),
        )?,
        GenerationConfig::default(),
    );

    dispatcher.generate(&store, &document, 0, &plan("General")).await?;

    assert_eq!(artist.call_count(), 0);
    assert!(fakes.media.requests.lock().unwrap().is_empty());
    let kept = std::fs::read_to_string(store.path(&ArtifactKind::Video(0)))?;
    assert_eq!(kept, "clip from an earlier run");
    Ok(())
}

#[tokio::test]
async fn test_unknown_style_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, document) = store(&dir).await?;
    let fakes = Fakes::default();
    let evaluator = Arc::new(MockModel::constant("evaluator", "YES"));
    let dispatcher = GenerationDispatcher::new(
        fakes.services(
            Arc::new(MockModel::constant("planner", "unused")),
            Arc::new(MockModel::constant("artist", "unused")),
            evaluator.clone(),
        )?,
        GenerationConfig::default(),
    );

    let err = dispatcher
        .generate(&store, &document, 2, &plan("Watercolor"))
        .await
        .unwrap_err();

    match err.kind() {
        ReelErrorKind::Generation(e) => {
            assert_eq!(e.kind, GenerationErrorKind::UnknownStyle("Watercolor".to_string()))
        }
        other => panic!("expected generation error, got {other}"),
    }
    assert_eq!(evaluator.call_count(), 0);
    assert!(!store.exists(&ArtifactKind::Segment(2)).await);
    Ok(())
}
