//! End-to-end pipeline: decompose, plan, generate, concatenate.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use reel_core::{DocumentId, DocumentRef, ScenePlan, Segment, UsageSnapshot};
use reel_error::ReelResult;
use reel_generation::{GenerationConfig, GenerationDispatcher, Services};
use reel_planning::{
    Decomposition, ExampleLibrary, PlanningConfig, SceneDecomposer, ScenePlanner,
    VerdictClassifier,
};
use reel_storage::{ArtifactKind, ArtifactStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of one document run.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct RunSummary {
    /// Document the run was for
    document: DocumentId,
    /// Concatenated video; absent when every scene was skipped
    final_video: Option<PathBuf>,
    /// Finished segments in scene order
    segments: Vec<Segment>,
    /// Scenes skipped because they need manual intervention
    skipped: Vec<usize>,
    /// Model usage across all roles
    usage: UsageSnapshot,
    /// Run start
    started_at: DateTime<Utc>,
    /// Run end
    finished_at: DateTime<Utc>,
}

/// Drives one document through the whole pipeline, strictly in scene order.
pub struct Orchestrator {
    decomposer: SceneDecomposer,
    planner: ScenePlanner,
    dispatcher: GenerationDispatcher,
    services: Services,
}

impl Orchestrator {
    /// Wire the pipeline stages to `services`.
    pub fn new(services: Services, planning: PlanningConfig, generation: GenerationConfig) -> Self {
        Self {
            decomposer: SceneDecomposer::new(
                services.planner().clone(),
                services.evaluator().clone(),
                planning.clone(),
            ),
            planner: ScenePlanner::new(
                services.planner().clone(),
                services.evaluator().clone(),
                planning,
            ),
            dispatcher: GenerationDispatcher::new(services.clone(), generation),
            services,
        }
    }

    /// Offer worked examples to every stage.
    pub fn with_examples(self, examples: ExampleLibrary) -> Self {
        Self {
            decomposer: self.decomposer.with_examples(examples.clone()),
            planner: self.planner.with_examples(examples.clone()),
            dispatcher: self.dispatcher.with_examples(examples),
            services: self.services,
        }
    }

    /// Use a different verdict classifier in every loop.
    pub fn with_classifier(self, classifier: Arc<dyn VerdictClassifier>) -> Self {
        Self {
            decomposer: self.decomposer.with_classifier(classifier.clone()),
            planner: self.planner.with_classifier(classifier.clone()),
            dispatcher: self.dispatcher.with_classifier(classifier),
            services: self.services,
        }
    }

    /// Decompose the document and plan every scene.
    ///
    /// A `supplied` scene plan replaces the decomposition loop.
    ///
    /// # Errors
    ///
    /// Returns error when planning fails terminally or yields no scenes.
    #[tracing::instrument(skip(self, store, document, supplied), fields(document = %document))]
    pub async fn plan(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
        supplied: Option<&str>,
    ) -> ReelResult<(Decomposition, Vec<ScenePlan>)> {
        let decomposition = match supplied {
            Some(text) => self.decomposer.adopt(store, text).await?,
            None => self.decomposer.decompose(store, document).await?,
        };
        tracing::info!(
            scenes = decomposition.scenes().len(),
            iterations = decomposition.iterations(),
            accepted = decomposition.accepted(),
            origin = %decomposition.origin(),
            "Scene decomposition ready"
        );
        let plans = self
            .planner
            .plan_all(store, document, decomposition.scenes())
            .await?;
        Ok((decomposition, plans))
    }

    /// Run the full pipeline for `document`.
    ///
    /// Scenes that need manual intervention are skipped and reported; any
    /// other failure aborts the run.
    ///
    /// # Errors
    ///
    /// Returns error on a terminal planning, generation, persistence or
    /// concatenation failure.
    #[tracing::instrument(skip(self, store, document, supplied), fields(document = %document))]
    pub async fn run(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
        supplied: Option<&str>,
    ) -> ReelResult<RunSummary> {
        let started_at = Utc::now();
        let (_, plans) = self.plan(store, document, supplied).await?;

        let mut segments = Vec::with_capacity(plans.len());
        let mut skipped = Vec::new();
        for (index, plan) in plans.iter().enumerate() {
            match self.dispatcher.generate(store, document, index, plan).await {
                Ok(segment) => segments.push(segment),
                Err(e) if e.is_manual_intervention() => {
                    tracing::warn!(scene = index, error = %e, "Skipping scene");
                    skipped.push(index);
                }
                Err(e) => return Err(e),
            }
        }

        let final_video = self.assemble(store, &segments).await?;
        let summary = RunSummary {
            document: store.document().clone(),
            final_video,
            segments,
            skipped,
            usage: self.usage(),
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            segments = summary.segments.len(),
            skipped = summary.skipped.len(),
            requests = summary.usage.requests,
            cost = summary.usage.estimated_cost,
            "Run finished"
        );
        Ok(summary)
    }

    /// Usage summed over the three model roles.
    pub fn usage(&self) -> UsageSnapshot {
        self.services
            .planner()
            .usage()
            .combine(self.services.evaluator().usage())
            .combine(self.services.artist().usage())
    }

    async fn assemble(
        &self,
        store: &ArtifactStore,
        segments: &[Segment],
    ) -> ReelResult<Option<PathBuf>> {
        if segments.is_empty() {
            tracing::warn!("No segments produced, skipping concatenation");
            return Ok(None);
        }
        let kind = ArtifactKind::FinalVideo;
        if segments.iter().all(|s| *s.from_cache()) && store.exists(&kind).await {
            tracing::info!("Reusing final video");
            return Ok(Some(store.path(&kind)));
        }
        let paths: Vec<PathBuf> = segments.iter().map(|s| s.path().clone()).collect();
        let destination = store.prepare(&kind).await?;
        let path = self.services.composer().concat(&paths, &destination).await?;
        Ok(Some(path))
    }
}
