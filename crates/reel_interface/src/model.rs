//! Language model traits.

use async_trait::async_trait;
use reel_core::{Attachments, ModelReply, ModelRequest, UsageSnapshot};
use reel_error::{ModelError, ReelResult};
use serde_json::Value;

/// Caller-supplied check applied to the structured value parsed from a
/// model response. `Err` carries the reason the value was rejected.
pub type SchemaCheck = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// Transport for one specific model backend.
///
/// A backend performs exactly one request. It never retries; it reports
/// whether a failure is retryable through [`reel_error::RetryableError`].
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one request and return the raw reply.
    async fn send(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;

    /// Provider name (e.g., "openai", "dashscope").
    fn provider_name(&self) -> &'static str;
}

/// Resilient model invocation used by every planning, evaluation and
/// generation step.
///
/// `invoke` either returns text (validated against `schema_check` when one
/// is given) or fails with a terminal error after exhausting its budgets.
/// Callers never retry a failed `invoke`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` with `attachments` and return the model's text.
    async fn invoke(
        &self,
        prompt: &str,
        attachments: &Attachments,
        schema_check: Option<&SchemaCheck>,
    ) -> ReelResult<String>;

    /// Role this client plays in the pipeline (e.g., "planner").
    fn role(&self) -> &str;

    /// Usage accumulated so far.
    fn usage(&self) -> UsageSnapshot {
        UsageSnapshot::default()
    }
}
