//! Request and reply types for a single model call.

use crate::Attachments;
use serde::{Deserialize, Serialize};

/// One fully assembled model call as handed to a transport backend.
///
/// # Examples
///
/// ```
/// use reel_core::{Attachments, ModelRequest};
///
/// let request = ModelRequest::builder()
///     .model("gpt-4o")
///     .system(Some("You are a planner.".to_string()))
///     .prompt("Split this paper into scenes.")
///     .attachments(Attachments::none())
///     .temperature(Some(0.7))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.prompt(), "Split this paper into scenes.");
/// assert_eq!(*request.max_tokens(), None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ModelRequest {
    /// Model identifier understood by the backend
    model: String,
    /// System/persona message, attached on every call
    #[builder(default)]
    system: Option<String>,
    /// User prompt
    prompt: String,
    /// Images and document
    #[builder(default)]
    attachments: Attachments,
    /// Sampling temperature
    #[builder(default)]
    temperature: Option<f32>,
    /// Maximum completion tokens
    #[builder(default)]
    max_tokens: Option<u32>,
}

impl ModelRequest {
    /// Creates a new request builder.
    pub fn builder() -> ModelRequestBuilder {
        ModelRequestBuilder::default()
    }
}

/// Text returned by a backend plus whatever usage it reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    /// Generated text
    pub text: String,
    /// Prompt tokens, if reported
    pub prompt_tokens: Option<u64>,
    /// Completion tokens, if reported
    pub completion_tokens: Option<u64>,
}

impl ModelReply {
    /// A reply carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Point-in-time copy of a client's usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Successful requests
    pub requests: u64,
    /// Prompt tokens consumed
    pub prompt_tokens: u64,
    /// Completion tokens produced
    pub completion_tokens: u64,
    /// Estimated spend in dollars
    pub estimated_cost: f64,
}

impl UsageSnapshot {
    /// Sums two snapshots.
    pub fn combine(self, other: UsageSnapshot) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.requests + other.requests,
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            estimated_cost: self.estimated_cost + other.estimated_cost,
        }
    }
}
