//! Evaluator verdicts.

use serde::{Deserialize, Serialize};

/// Evaluator output reduced to accept/reject plus rationale.
///
/// Transient: produced by one evaluator call and consumed by the next
/// refinement call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the artifact passed
    pub accepted: bool,
    /// Evaluator rationale, used as regeneration feedback
    pub feedback: String,
}

impl Verdict {
    /// An accepting verdict.
    pub fn accept(feedback: impl Into<String>) -> Self {
        Self {
            accepted: true,
            feedback: feedback.into(),
        }
    }

    /// A rejecting verdict.
    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            accepted: false,
            feedback: feedback.into(),
        }
    }
}
