//! In-memory collaborators shared by the pipeline's integration tests.
//!
//! [`MockModel`] scripts a language model; [`Fakes`] holds one stand-in
//! for every media, document and rendering service.

mod fakes;
mod mock_model;

pub use fakes::{
    FakeAnimator, FakeAvatar, FakeComposer, FakeDocuments, FakeDownloader, FakeMedia,
    FakeMolecules, FakeSpeech, FakeStructures, Fakes,
};
pub use mock_model::{MockModel, Responder};
