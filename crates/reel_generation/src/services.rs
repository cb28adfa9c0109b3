//! External collaborators used by the generation routes.

use derive_getters::Getters;
use reel_interface::{
    AnimationRenderer, DocumentExtractor, Downloader, LanguageModel, MediaComposer,
    MediaTaskService, MoleculeRenderer, SpeechSynthesizer, StructureDatabase, TalkingHeadService,
};
use std::sync::Arc;

/// Everything a route may call out to.
///
/// Model roles: `planner` locates document assets and rewrites slide
/// captions, `artist` writes generation prompts and animation code,
/// `evaluator` judges candidates, classifies professional scenes and
/// repairs code that failed to render.
#[derive(Clone, Getters, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct Services {
    /// Planner model
    planner: Arc<dyn LanguageModel>,
    /// Artist model
    artist: Arc<dyn LanguageModel>,
    /// Evaluator model
    evaluator: Arc<dyn LanguageModel>,
    /// Text-to-video and text-to-image tasks
    media: Arc<dyn MediaTaskService>,
    /// Narration synthesis
    speech: Arc<dyn SpeechSynthesizer>,
    /// Presenter avatar
    talking_head: Arc<dyn TalkingHeadService>,
    /// Remote result download
    downloader: Arc<dyn Downloader>,
    /// Figure and table extraction
    documents: Arc<dyn DocumentExtractor>,
    /// Local media composition
    composer: Arc<dyn MediaComposer>,
    /// Animation code rendering
    animator: Arc<dyn AnimationRenderer>,
    /// Molecule structure lookup
    structures: Arc<dyn StructureDatabase>,
    /// Molecule turntable rendering
    molecules: Arc<dyn MoleculeRenderer>,
}

impl Services {
    /// Start building a service bundle.
    pub fn builder() -> ServicesBuilder {
        ServicesBuilder::default()
    }
}
