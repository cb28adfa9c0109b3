//! Scene planning for the reel pipeline.
//!
//! [`SceneDecomposer`] turns a document into an ordered list of scenes;
//! [`ScenePlanner`] turns each scene into a [`reel_core::ScenePlan`] by
//! walking a [`FieldGate`] over the plan fields. Both loops draft with the
//! planner model, judge with the evaluator model and reduce evaluator text
//! to a [`reel_core::Verdict`] through a [`VerdictClassifier`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod config;
mod decomposer;
mod examples;
mod gate;
mod planner;
pub mod prompts;

pub use classifier::{RejectionTokenClassifier, StructuredVerdictClassifier, VerdictClassifier};
pub use config::PlanningConfig;
pub use decomposer::{Decomposition, PlanOrigin, SceneDecomposer, scenes_from_value};
pub use examples::ExampleLibrary;
pub use gate::{FieldGate, next_cursor};
pub use planner::{ScenePlanner, ScenePlanning};
