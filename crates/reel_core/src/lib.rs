//! Core data types for the reel pipeline.
//!
//! Documents, attachments, scene descriptors, scene plans, styles, verdicts
//! and produced media. Scene index is the only join key between them.
//! [`extract_structured`] recovers JSON values from noisy model output.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod alignment;
mod artifact;
mod attachment;
mod document;
mod extraction;
mod plan;
mod request;
mod scene;
mod style;
mod time;
mod verdict;

pub use alignment::{Alignment, MAX_SPEED_FACTOR, STILL_DURATION_RANGE, clamp_still_duration};
pub use artifact::{MediaArtifact, Segment};
pub use attachment::Attachments;
pub use document::{DocumentId, DocumentRef};
pub use extraction::{extract_code, extract_field, extract_structured};
pub use plan::{PlanField, ScenePlan};
pub use request::{ModelReply, ModelRequest, ModelRequestBuilder, UsageSnapshot};
pub use scene::SceneDescriptor;
pub use style::{ProfessionalKind, Style};
pub use time::{DEFAULT_TIME_BUDGET_SECS, parse_time_budget};
pub use verdict::Verdict;
