//! Test utilities for generation tests.

use reel_generation::Services;
use reel_interface::LanguageModel;
use std::sync::Arc;

#[allow(unused_imports)]
pub use reel_testing::{FakeAnimator, FakeStructures, Fakes, MockModel};

/// Wires a [`Fakes`] set and three models into [`Services`].
pub trait FakeServices {
    fn services(
        &self,
        planner: Arc<dyn LanguageModel>,
        artist: Arc<dyn LanguageModel>,
        evaluator: Arc<dyn LanguageModel>,
    ) -> anyhow::Result<Services>;
}

impl FakeServices for Fakes {
    fn services(
        &self,
        planner: Arc<dyn LanguageModel>,
        artist: Arc<dyn LanguageModel>,
        evaluator: Arc<dyn LanguageModel>,
    ) -> anyhow::Result<Services> {
        Ok(Services::builder()
            .planner(planner)
            .artist(artist)
            .evaluator(evaluator)
            .media(self.media.clone())
            .speech(self.speech.clone())
            .talking_head(self.avatar.clone())
            .downloader(self.downloader.clone())
            .documents(self.documents.clone())
            .composer(self.composer.clone())
            .animator(self.animator.clone())
            .structures(self.structures.clone())
            .molecules(self.molecules.clone())
            .build()?)
    }
}
