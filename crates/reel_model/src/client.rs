//! The resilient model client.

use crate::{RetryPolicy, UsageCounter};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reel_core::{Attachments, ModelReply, ModelRequest, UsageSnapshot, extract_structured};
use reel_error::{ConfigError, ModelError, ModelErrorKind, ReelResult, RetryableError};
use reel_interface::{LanguageModel, ModelBackend, SchemaCheck};
use std::sync::Mutex;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, info, warn};

/// Tracing target carrying full prompt/response bodies.
pub const TRANSCRIPT_TARGET: &str = "reel::transcript";

/// Wraps one backend with retry/backoff, output validation and usage
/// accounting.
///
/// The client holds no conversation state: the configured system message
/// is attached to every request.
///
/// # Examples
///
/// ```no_run
/// use reel_model::{ModelClient, OpenAiBackend, RetryPolicy};
///
/// let backend = OpenAiBackend::new("https://api.openai.com/v1", "sk-...");
/// let planner = ModelClient::new("planner", "gpt-4o", backend)
///     .with_system_message("You are an expert science communicator.")
///     .with_temperature(0.7)
///     .with_retry_policy(RetryPolicy::default())
///     .with_seed(0);
/// ```
pub struct ModelClient<B: ModelBackend> {
    backend: B,
    role: String,
    model: String,
    system_message: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
    usage: UsageCounter,
}

impl<B: ModelBackend> ModelClient<B> {
    /// Client for `model` in pipeline role `role`.
    pub fn new(role: impl Into<String>, model: impl Into<String>, backend: B) -> Self {
        Self {
            backend,
            role: role.into(),
            model: model.into(),
            system_message: None,
            temperature: None,
            max_tokens: None,
            policy: RetryPolicy::default(),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            usage: UsageCounter::default(),
        }
    }

    /// Set the system/persona message.
    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the retry budget.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed the jitter generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn next_seed(&self) -> u64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..u64::MAX),
            Err(_) => 0,
        }
    }

    /// One transport round with backoff. Fails with `ExhaustedRetries` once
    /// every attempt hit a retryable error, or immediately on a permanent
    /// one.
    async fn send_with_retry(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let schedule = self.policy.schedule(self.next_seed());
        let recommended = schedule.recommended();
        let mut attempt = 0u32;

        let result = Retry::spawn(
            schedule.inspect(|delay| {
                warn!(
                    role = %self.role,
                    delay_secs = delay.as_secs_f64(),
                    "Retrying model request after delay"
                )
            }),
            || {
                attempt += 1;
                let n = attempt;
                let recommended = recommended.clone();
                async move {
                    match self.backend.send(request).await {
                        Ok(reply) => Ok(reply),
                        Err(e) if e.is_retryable() => {
                            warn!(
                                role = %self.role,
                                attempt = n,
                                error = %e,
                                "Model request failed, will retry"
                            );
                            recommended.set(e.retry_after());
                            Err(RetryError::Transient {
                                err: e,
                                retry_after: None,
                            })
                        }
                        Err(e) => {
                            error!(
                                role = %self.role,
                                attempt = n,
                                error = %e,
                                "Permanent model error, failing immediately"
                            );
                            Err(RetryError::Permanent(e))
                        }
                    }
                }
            },
        )
        .await;

        result.map_err(|e| {
            if e.is_retryable() {
                error!(role = %self.role, attempts = attempt, "Too many errors querying model");
                ModelError::new(ModelErrorKind::ExhaustedRetries {
                    attempts: attempt,
                    last: e.kind.to_string(),
                })
            } else {
                e
            }
        })
    }
}

#[async_trait]
impl<B: ModelBackend> LanguageModel for ModelClient<B> {
    #[tracing::instrument(
        skip(self, prompt, attachments, schema_check),
        fields(
            role = %self.role,
            model = %self.model,
            prompt_len = prompt.len(),
            images = attachments.images().len(),
            validated = schema_check.is_some()
        )
    )]
    async fn invoke(
        &self,
        prompt: &str,
        attachments: &Attachments,
        schema_check: Option<&SchemaCheck>,
    ) -> ReelResult<String> {
        if prompt.trim().is_empty() {
            return Err(ModelError::new(ModelErrorKind::EmptyPrompt).into());
        }

        let request = ModelRequest::builder()
            .model(self.model.clone())
            .system(self.system_message.clone())
            .prompt(prompt)
            .attachments(attachments.clone())
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build model request: {}", e)))?;

        let attempts = self.policy.max_attempts();
        let mut last_reason = String::new();
        for attempt in 1..=attempts {
            let reply = self.send_with_retry(&request).await?;
            let usage = self.usage.record(&request, &reply);
            debug!(
                target: TRANSCRIPT_TARGET,
                role = %self.role,
                attempt,
                prompt = %prompt,
                response = %reply.text,
                "Model exchange"
            );
            info!(
                requests = usage.requests,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                estimated_cost = usage.estimated_cost,
                "Model usage"
            );

            let Some(check) = schema_check else {
                return Ok(reply.text);
            };
            match extract_structured(&reply.text) {
                Ok(value) => match check(&value) {
                    Ok(()) => return Ok(reply.text),
                    Err(reason) => last_reason = reason,
                },
                Err(e) => last_reason = e.message,
            }
            warn!(
                attempt,
                max_attempts = attempts,
                reason = %last_reason,
                "Model output failed validation, re-querying"
            );
        }

        Err(ModelError::new(ModelErrorKind::InvalidOutput {
            attempts,
            reason: last_reason,
        })
        .into())
    }

    fn role(&self) -> &str {
        &self.role
    }

    fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }
}
