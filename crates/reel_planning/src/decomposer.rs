//! High-level planning: document to ordered scene list.

use crate::{
    ExampleLibrary, PlanningConfig, RejectionTokenClassifier, VerdictClassifier, prompts,
};
use derive_getters::Getters;
use reel_core::{Attachments, DocumentRef, SceneDescriptor, extract_structured};
use reel_error::{PlanningError, PlanningErrorKind, ReelResult};
use reel_interface::LanguageModel;
use reel_storage::{ArtifactKind, ArtifactStore};
use serde_json::Value;
use std::sync::Arc;

/// Where a scene list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PlanOrigin {
    /// Drafted and evaluated in this run
    #[display("generated")]
    Generated,
    /// Loaded from the artifact store
    #[display("cached")]
    Cached,
    /// Supplied by the caller
    #[display("supplied")]
    Supplied,
}

/// Result of scene decomposition.
#[derive(Debug, Clone, Getters)]
pub struct Decomposition {
    /// Scenes in narrative order
    scenes: Vec<SceneDescriptor>,
    /// Draft/evaluate rounds spent
    iterations: u32,
    /// Whether the evaluator accepted the final plan
    accepted: bool,
    /// Where the scenes came from
    origin: PlanOrigin,
}

/// Breaks a document into an ordered list of scenes.
///
/// Each round drafts a free-text breakdown, formats it into scene records
/// and asks the evaluator for a verdict; rejection feedback drives the next
/// draft. The loop ends on the first acceptance or when
/// `max_high_iterations` rounds are spent, in which case the last plan is
/// used. An accepted plan is persisted and reused by later runs.
pub struct SceneDecomposer {
    planner: Arc<dyn LanguageModel>,
    evaluator: Arc<dyn LanguageModel>,
    classifier: Arc<dyn VerdictClassifier>,
    config: PlanningConfig,
    examples: Option<ExampleLibrary>,
}

impl SceneDecomposer {
    /// Create a decomposer with the default rejection-token classifier.
    pub fn new(
        planner: Arc<dyn LanguageModel>,
        evaluator: Arc<dyn LanguageModel>,
        config: PlanningConfig,
    ) -> Self {
        Self {
            planner,
            evaluator,
            classifier: Arc::new(RejectionTokenClassifier::default()),
            config,
            examples: None,
        }
    }

    /// Use a different verdict classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn VerdictClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Append worked examples to the first draft request.
    pub fn with_examples(mut self, examples: ExampleLibrary) -> Self {
        self.examples = Some(examples);
        self
    }

    /// Decompose `document`, reusing a persisted plan when one exists.
    ///
    /// # Errors
    ///
    /// Returns error if a model call fails terminally, the plan cannot be
    /// persisted, or the final plan has no scenes.
    #[tracing::instrument(skip(self, store, document), fields(document = %document))]
    pub async fn decompose(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
    ) -> ReelResult<Decomposition> {
        if let Some(records) = store.load_json::<Value>(&ArtifactKind::HighPlan).await? {
            let scenes = scenes_from_value(&records);
            if !scenes.is_empty() {
                tracing::info!(scenes = scenes.len(), "Reusing persisted scene plan");
                return Ok(Decomposition {
                    scenes,
                    iterations: 0,
                    accepted: true,
                    origin: PlanOrigin::Cached,
                });
            }
            tracing::warn!("Persisted scene plan has no scenes, planning again");
        }

        let attachments = Attachments::none().with_document(document.clone());
        let mut draft: Option<String> = None;
        let mut feedback = String::new();
        let mut scenes = Vec::new();
        let mut accepted = false;
        let mut iterations = 0;

        while iterations < *self.config.max_high_iterations() {
            iterations += 1;
            let prompt = match &draft {
                None => self.first_prompt(),
                Some(previous) => {
                    format!("{}\n{}\n{}", previous, prompts::HIGH_REPLAN, feedback)
                }
            };
            let text = self.planner.invoke(&prompt, &attachments, None).await?;

            let formatted = self
                .planner
                .invoke(
                    &format!("{}\n{}", prompts::HIGH_PLAN_FORMAT, text),
                    &attachments,
                    None,
                )
                .await?;
            scenes = match extract_structured(&formatted) {
                Ok(value) => scenes_from_value(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "Scene list could not be extracted");
                    Vec::new()
                }
            };
            draft = Some(text);
            tracing::info!(iteration = iterations, scenes = scenes.len(), "Drafted scene plan");

            if !*self.config.reflection() {
                accepted = true;
                break;
            }

            let response = self
                .evaluator
                .invoke(
                    &format!("{}\n{}", prompts::HIGH_EVALUATE, formatted),
                    &attachments,
                    None,
                )
                .await?;
            let verdict = self.classifier.classify(&response);
            if verdict.accepted {
                accepted = true;
                tracing::info!(iteration = iterations, "Scene plan accepted");
                break;
            }
            tracing::info!(iteration = iterations, "Scene plan rejected");
            feedback = verdict.feedback;
        }

        if !accepted {
            tracing::warn!(
                iterations,
                "Scene planning budget exhausted, using the last plan"
            );
        }
        self.persist(store, scenes, iterations, accepted, PlanOrigin::Generated)
            .await
    }

    /// Adopt a caller-supplied plan (e.g. from an earlier run) instead of
    /// drafting one. The text is parsed like a formatted plan.
    ///
    /// # Errors
    ///
    /// Returns error if the text holds no scenes or cannot be persisted.
    #[tracing::instrument(skip(self, store, plan_text))]
    pub async fn adopt(&self, store: &ArtifactStore, plan_text: &str) -> ReelResult<Decomposition> {
        let value = extract_structured(plan_text)?;
        let scenes = scenes_from_value(&value);
        self.persist(store, scenes, 0, true, PlanOrigin::Supplied).await
    }

    fn first_prompt(&self) -> String {
        match self.examples.as_ref().filter(|_| *self.config.examples()) {
            Some(examples) if !examples.high_examples().is_empty() => format!(
                "{}\n{}\n{}",
                prompts::HIGH_PLANNING,
                prompts::EXAMPLES_PREAMBLE,
                examples.high_text()
            ),
            _ => prompts::HIGH_PLANNING.to_string(),
        }
    }

    async fn persist(
        &self,
        store: &ArtifactStore,
        scenes: Vec<SceneDescriptor>,
        iterations: u32,
        accepted: bool,
        origin: PlanOrigin,
    ) -> ReelResult<Decomposition> {
        if scenes.is_empty() {
            return Err(PlanningError::new(PlanningErrorKind::NoScenes).into());
        }
        store.save_json(&ArtifactKind::HighPlan, &scenes).await?;
        Ok(Decomposition {
            scenes,
            iterations,
            accepted,
            origin,
        })
    }
}

/// Scene descriptors from a formatted plan value.
///
/// Accepts a list of records, an object wrapping such a list, or a single
/// record. Records without a description are dropped.
pub fn scenes_from_value(value: &Value) -> Vec<SceneDescriptor> {
    match value {
        Value::Array(records) => records
            .iter()
            .filter_map(SceneDescriptor::from_record)
            .collect(),
        Value::Object(map) => match map.values().find(|v| v.is_array()) {
            Some(list) => scenes_from_value(list),
            None => SceneDescriptor::from_record(value).into_iter().collect(),
        },
        _ => Vec::new(),
    }
}
