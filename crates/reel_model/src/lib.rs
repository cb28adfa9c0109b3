//! Resilient language model invocation.
//!
//! [`ModelClient`] wraps a [`reel_interface::ModelBackend`] with
//! - transport retries using exponential backoff with jitter
//!   ([`RetryPolicy`], [`Backoff`]) driven through `tokio-retry2`
//! - optional schema validation of the structured value in the response,
//!   re-querying on invalid output under a separate budget
//! - usage counters and a running cost estimate ([`UsageCounter`])
//!
//! [`OpenAiBackend`] is the HTTP transport for OpenAI-compatible endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod openai;
mod policy;
mod usage;

pub use client::{ModelClient, TRANSCRIPT_TARGET};
pub use openai::OpenAiBackend;
pub use policy::{Backoff, RecommendedDelay, RetryPolicy};
pub use usage::{COMPLETION_COST_PER_1K, PROMPT_COST_PER_1K, UsageCounter};
