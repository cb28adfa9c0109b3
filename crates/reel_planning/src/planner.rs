//! Low-level planning: one scene to a field-gated plan.

use crate::{
    ExampleLibrary, FieldGate, PlanningConfig, RejectionTokenClassifier, VerdictClassifier,
    prompts,
};
use derive_getters::Getters;
use reel_core::{
    Attachments, DocumentRef, PlanField, SceneDescriptor, ScenePlan, extract_field,
    extract_structured,
};
use reel_error::ReelResult;
use reel_interface::LanguageModel;
use reel_storage::{ArtifactKind, ArtifactStore};
use serde_json::Value;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Result of planning one scene.
#[derive(Debug, Clone, Getters)]
pub struct ScenePlanning {
    /// The plan handed to generation
    plan: ScenePlan,
    /// Full-plan drafts requested
    drafts: u32,
    /// Gate questions asked
    evaluations: u32,
    /// Whether every field passed its gate
    accepted: bool,
    /// Whether the plan was loaded from the artifact store
    from_cache: bool,
}

/// Plans a single scene through the field gate.
///
/// Every draft is a complete plan. Fields the gate already committed keep
/// their accepted values; the others take whatever the draft says. The
/// evaluator then walks forward from the cursor one field at a time until it
/// rejects a field or the gate completes. A rejection sends its feedback
/// into the next draft. After `max_low_iterations` drafts the last plan is
/// used as is.
pub struct ScenePlanner {
    planner: Arc<dyn LanguageModel>,
    evaluator: Arc<dyn LanguageModel>,
    classifier: Arc<dyn VerdictClassifier>,
    config: PlanningConfig,
    examples: Option<ExampleLibrary>,
}

impl ScenePlanner {
    /// Create a planner with the default rejection-token classifier.
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

    /// Append worked examples to each scene's first draft request.
    pub fn with_examples(mut self, examples: ExampleLibrary) -> Self {
        self.examples = Some(examples);
        self
    }

    /// Plan scene `index`, reusing its persisted plan when one exists.
    ///
    /// # Errors
    ///
    /// Returns error if a model call fails terminally or the plan cannot be
    /// persisted.
    #[tracing::instrument(skip(self, store, document, scene), fields(scene = index))]
    pub async fn plan_scene(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
        index: usize,
        scene: &SceneDescriptor,
    ) -> ReelResult<ScenePlanning> {
        let kind = ArtifactKind::ScenePlan(index);
        if let Some(plan) = store.load_json::<ScenePlan>(&kind).await? {
            tracing::info!("Reusing persisted scene plan");
            return Ok(ScenePlanning {
                plan,
                drafts: 0,
                evaluations: 0,
                accepted: true,
                from_cache: true,
            });
        }

        let attachments = Attachments::none().with_document(document.clone());
        let mut plan = ScenePlan::for_scene(scene);
        let mut gate = FieldGate::new();
        let mut previous: Option<String> = None;
        let mut feedback = String::new();
        let mut drafts = 0;
        let mut evaluations = 0;
        let mut accepted = false;

        while drafts < *self.config.max_low_iterations() && !gate.is_complete() {
            drafts += 1;
            let prompt = match &previous {
                None => self.first_prompt(index, scene),
                Some(formatted) => {
                    format!("{}\n{}\n{}", formatted, prompts::LOW_REPLAN, feedback)
                }
            };
            let draft = self.planner.invoke(&prompt, &attachments, None).await?;
            let formatted = self
                .planner
                .invoke(
                    &format!("{}\n{}", draft, prompts::LOW_PLAN_FORMAT),
                    &attachments,
                    None,
                )
                .await?;

            match extract_structured(&formatted) {
                Ok(value) => {
                    let changed = merge_uncommitted(&mut plan, &value, &gate);
                    tracing::debug!(draft = drafts, changed, "Merged scene plan draft");
                }
                Err(e) => tracing::warn!(draft = drafts, error = %e, "Scene plan draft was not structured"),
            }

            if !*self.config.reflection() {
                accepted = true;
                break;
            }

            while let Some(field) = gate.current() {
                if let Some(value) = extract_field(&formatted, field.as_ref()) {
                    plan.set_field(field, value);
                }
                let prompt = format!(
                    "{}\n{}\n{}",
                    prompts::LOW_EVALUATE,
                    prompts::field_question(field),
                    describe(&plan)
                );
                let response = self.evaluator.invoke(&prompt, &attachments, None).await?;
                evaluations += 1;
                let verdict = self.classifier.classify(&response);
                gate.advance(&verdict);
                if !verdict.accepted {
                    tracing::info!(draft = drafts, %field, "Field rejected");
                    feedback = verdict.feedback;
                    break;
                }
                tracing::debug!(draft = drafts, %field, "Field accepted");
            }
            previous = Some(formatted);
        }

        if gate.is_complete() {
            accepted = true;
        }
        if !accepted {
            tracing::warn!(
                drafts,
                cursor = gate.cursor(),
                "Scene plan budget exhausted, using the last plan"
            );
        }
        store.save_json(&kind, &plan).await?;
        tracing::info!(drafts, evaluations, accepted, style = %plan.style(), "Scene planned");

        Ok(ScenePlanning {
            plan,
            drafts,
            evaluations,
            accepted,
            from_cache: false,
        })
    }

    /// Plan every scene in index order.
    pub async fn plan_all(
        &self,
        store: &ArtifactStore,
        document: &DocumentRef,
        scenes: &[SceneDescriptor],
    ) -> ReelResult<Vec<ScenePlan>> {
        let mut plans = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            let planning = self.plan_scene(store, document, index, scene).await?;
            plans.push(planning.plan);
        }
        Ok(plans)
    }

    fn first_prompt(&self, index: usize, scene: &SceneDescriptor) -> String {
        let mut prompt = format!("{}\n{}", prompts::LOW_PLANNING, scene.to_record(index));
        if let Some(examples) = self.examples.as_ref().filter(|_| *self.config.examples()) {
            if !examples.low_examples().is_empty() {
                prompt.push('\n');
                prompt.push_str(prompts::EXAMPLES_PREAMBLE);
                prompt.push('\n');
                prompt.push_str(&examples.low_text());
            }
        }
        prompt
    }
}

/// Overwrite uncommitted fields with the draft's values.
fn merge_uncommitted(plan: &mut ScenePlan, draft: &Value, gate: &FieldGate) -> usize {
    let mut merged = plan.clone();
    merged.merge_draft(draft);
    let mut changed = 0;
    for field in PlanField::iter().filter(|field| !gate.is_committed(*field)) {
        if merged.field(field) != plan.field(field) {
            plan.set_field(field, merged.field(field));
            changed += 1;
        }
    }
    changed
}

/// Plan rendered for an evaluator prompt.
fn describe(plan: &ScenePlan) -> String {
    format!(
        "scenario: {}\ntime_cost: {}\nstyle: {}\naudio_content: {}\nsource: {}\nprompt: {}",
        plan.scenario(),
        plan.time_cost(),
        plan.style(),
        plan.audio_content(),
        plan.source(),
        plan.prompt()
    )
}
