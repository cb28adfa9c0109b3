//! OpenAI-compatible chat completion backend.
//!
//! Works against any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI, Azure deployments behind a gateway, DashScope compatible mode,
//! local servers). Images are sent inline as base64 data URLs; an attached
//! document is converted to text and sent as an extra text part.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use reel_core::{ModelReply, ModelRequest};
use reel_error::{ModelError, ModelErrorKind};
use reel_interface::{DocumentExtractor, ModelBackend};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Chat completion backend over HTTP.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    documents: Option<Arc<dyn DocumentExtractor>>,
}

impl OpenAiBackend {
    /// Backend for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            documents: None,
        }
    }

    /// Read attached documents through `extractor`.
    pub fn with_document_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.documents = Some(extractor);
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn build_body(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        let mut content = vec![json!({"type": "text", "text": request.prompt()})];

        if let Some(document) = request.attachments().document() {
            let extractor = self.documents.as_ref().ok_or_else(|| {
                ModelError::new(ModelErrorKind::InvalidRequest(
                    "document attached but no document extractor configured".to_string(),
                ))
            })?;
            let text = extractor.read_full_text(document).await.map_err(|e| {
                ModelError::new(ModelErrorKind::InvalidRequest(format!(
                    "failed to read document {}: {}",
                    document, e
                )))
            })?;
            content.push(json!({
                "type": "text",
                "text": format!("<document name=\"{}\">\n{}\n</document>", document.id(), text)
            }));
        }

        for image in request.attachments().images() {
            content.push(json!({
                "type": "image_url",
                "image_url": {"url": image_data_url(image).await?, "detail": "auto"}
            }));
        }

        let mut messages = Vec::new();
        if let Some(system) = request.system() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": content}));

        let mut body = json!({"model": request.model(), "messages": messages});
        if let Some(temperature) = request.temperature() {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens() {
            body["max_tokens"] = json!(max_tokens);
        }
        Ok(body)
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    #[tracing::instrument(skip(self, request), fields(model = %request.model()))]
    async fn send(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let body = self.build_body(request).await?;
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::new(ModelErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        let header_delay = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(Duration::from_secs_f64);
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::new(ModelErrorKind::Transport(e.to_string())))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or(text);
            let retry_after = header_delay.or_else(|| recommended_delay(&message));
            return Err(ModelError::new(ModelErrorKind::HttpStatus {
                status_code: status.as_u16(),
                message,
                retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
            }));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ModelError::new(ModelErrorKind::MalformedResponse(format!(
                "{} (body: {})",
                e,
                text.chars().take(100).collect::<String>()
            )))
        })?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            ModelError::new(ModelErrorKind::MalformedResponse(
                "response contained no choices".to_string(),
            ))
        })?;
        let content = choice.message.content.unwrap_or_default();
        if content.is_empty() {
            return Err(ModelError::new(ModelErrorKind::MalformedResponse(format!(
                "empty completion (finish_reason: {})",
                choice.finish_reason.unwrap_or_default()
            ))));
        }

        Ok(ModelReply {
            text: content,
            prompt_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}

async fn image_data_url(path: &Path) -> Result<String, ModelError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ModelError::new(ModelErrorKind::InvalidRequest(format!(
            "failed to read image {}: {}",
            path.display(),
            e
        )))
    })?;
    let mime = match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

fn try_again_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"try again in (?:(\d+)m)?(\d+(?:\.\d+)?)(ms|s)")
            .expect("valid retry hint regex")
    })
}

/// Reads "Please try again in 1m2.5s" style hints from rate-limit messages.
pub(crate) fn recommended_delay(message: &str) -> Option<Duration> {
    let caps = try_again_pattern().captures(message)?;
    let minutes: f64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let amount: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds = match caps.get(3)?.as_str() {
        "ms" => amount / 1000.0,
        _ => amount,
    };
    Some(Duration::from_secs_f64(minutes * 60.0 + seconds))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_hints() {
        assert_eq!(
            recommended_delay("Rate limit reached. Please try again in 20s."),
            Some(Duration::from_secs(20))
        );
        assert_eq!(
            recommended_delay("Please try again in 1m2.5s"),
            Some(Duration::from_secs_f64(62.5))
        );
        assert_eq!(
            recommended_delay("Please try again in 250ms"),
            Some(Duration::from_millis(250))
        );
        assert_eq!(recommended_delay("quota exceeded"), None);
    }

    #[tokio::test]
    async fn request_body_carries_system_and_image() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let image = dir.path().join("frame.jpg");
        tokio::fs::write(&image, b"not really a jpeg").await?;

        let backend = OpenAiBackend::new("http://localhost:1/v1/", "key");
        let request = ModelRequest::builder()
            .model("gpt-4o")
            .system(Some("persona".to_string()))
            .prompt("judge this")
            .attachments(reel_core::Attachments::none().with_image(&image))
            .temperature(Some(0.5))
            .build()?;
        let body = backend.build_body(&request).await?;

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"][0]["text"], "judge this");
        let url = body["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap_or_default();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(body["temperature"], json!(0.5f32));
        assert!(body.get("max_tokens").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn document_without_extractor_is_rejected() {
        let backend = OpenAiBackend::new("http://localhost:1/v1", "key");
        let request = ModelRequest::builder()
            .model("gpt-4o")
            .prompt("plan")
            .attachments(
                reel_core::Attachments::none().with_document(reel_core::DocumentRef::new("a.pdf")),
            )
            .build()
            .unwrap();
        let err = backend.build_body(&request).await.unwrap_err();
        assert!(!reel_error::RetryableError::is_retryable(&err));
    }
}
