//! Trait definitions for the reel pipeline.
//!
//! Every external collaborator (model transports, media services, document
//! parsing, composition and rendering) sits behind one of these traits so
//! the planning and generation loops can be driven by fakes in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compose;
mod document;
mod media;
mod model;

pub use compose::{AnimationRenderer, MediaComposer, MoleculeRenderer, StructureDatabase};
pub use document::{AssetKind, DocumentExtractor};
pub use media::{
    Downloader, MediaTaskKind, MediaTaskRequest, MediaTaskService, SpeechSynthesizer,
    TalkingHeadService, TaskStatus,
};
pub use model::{LanguageModel, ModelBackend, SchemaCheck};
