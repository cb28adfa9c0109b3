//! DashScope asynchronous media tasks and speech synthesis.

use super::send_json;
use crate::config::{MediaServiceConfig, SpeechServiceConfig, secret};
use async_trait::async_trait;
use reel_error::{HttpError, ReelResult};
use reel_interface::{
    MediaTaskKind, MediaTaskRequest, MediaTaskService, SpeechSynthesizer, TaskStatus,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TaskEnvelope {
    output: TaskOutput,
}

#[derive(Debug, Deserialize)]
struct TaskOutput {
    task_id: Option<String>,
    task_status: Option<String>,
    video_url: Option<String>,
    results: Option<Vec<TaskResult>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechEnvelope {
    output: SpeechOutput,
}

#[derive(Debug, Deserialize)]
struct SpeechOutput {
    audio: SpeechAudio,
}

#[derive(Debug, Deserialize)]
struct SpeechAudio {
    url: String,
}

/// Text-to-video and text-to-image tasks.
pub struct DashScopeMedia {
    client: reqwest::Client,
    config: MediaServiceConfig,
    api_key: String,
}

impl DashScopeMedia {
    /// Client using the key named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key is not set.
    pub fn new(client: reqwest::Client, config: &MediaServiceConfig) -> ReelResult<Self> {
        Ok(Self {
            client,
            api_key: secret(config.api_key_env())?,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint().trim_end_matches('/')
    }
}

#[async_trait]
impl MediaTaskService for DashScopeMedia {
    #[tracing::instrument(skip(self, request), fields(kind = %request.kind))]
    async fn create_task(&self, request: &MediaTaskRequest) -> ReelResult<String> {
        let (path, model, default_size) = match request.kind {
            MediaTaskKind::Video => (
                "services/aigc/video-generation/video-synthesis",
                self.config.video_model(),
                self.config.video_size(),
            ),
            MediaTaskKind::Image => (
                "services/aigc/text2image/image-synthesis",
                self.config.image_model(),
                self.config.image_size(),
            ),
        };
        let body = json!({
            "model": model,
            "input": {"prompt": request.prompt},
            "parameters": {
                "size": request.size.as_deref().unwrap_or(default_size),
                "n": 1
            }
        });
        let envelope: TaskEnvelope = send_json(
            self.client
                .post(format!("{}/{}", self.endpoint(), path))
                .bearer_auth(&self.api_key)
                .header("X-DashScope-Async", "enable")
                .json(&body),
        )
        .await?;
        envelope.output.task_id.ok_or_else(|| {
            HttpError::new(format!(
                "Task submission returned no task id: {}",
                envelope.output.message.unwrap_or_default()
            ))
            .into()
        })
    }

    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus> {
        let envelope: TaskEnvelope = send_json(
            self.client
                .get(format!("{}/tasks/{}", self.endpoint(), task_id))
                .bearer_auth(&self.api_key),
        )
        .await?;
        Ok(task_status(envelope.output))
    }
}

fn task_status(output: TaskOutput) -> TaskStatus {
    let status = output.task_status.unwrap_or_default();
    match status.as_str() {
        "SUCCEEDED" => {
            let url = output.video_url.or_else(|| {
                output
                    .results
                    .and_then(|results| results.into_iter().find_map(|r| r.url))
            });
            match url {
                Some(url) => TaskStatus::Succeeded { url },
                None => TaskStatus::Failed {
                    reason: "task succeeded without a result url".to_string(),
                },
            }
        }
        "FAILED" | "CANCELED" | "UNKNOWN" => TaskStatus::Failed {
            reason: output.message.unwrap_or(status),
        },
        _ => TaskStatus::Pending,
    }
}

/// Narration synthesis returning a hosted audio URL.
pub struct DashScopeSpeech {
    client: reqwest::Client,
    config: SpeechServiceConfig,
    api_key: String,
}

impl DashScopeSpeech {
    /// Client using the key named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key is not set.
    pub fn new(client: reqwest::Client, config: &SpeechServiceConfig) -> ReelResult<Self> {
        Ok(Self {
            client,
            api_key: secret(config.api_key_env())?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for DashScopeSpeech {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> ReelResult<String> {
        let body = json!({
            "model": self.config.model(),
            "input": {"text": text, "voice": self.config.voice()}
        });
        let envelope: SpeechEnvelope = send_json(
            self.client
                .post(format!(
                    "{}/services/aigc/multimodal-generation/generation",
                    self.config.endpoint().trim_end_matches('/')
                ))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        Ok(envelope.output.audio.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(value: serde_json::Value) -> TaskOutput {
        serde_json::from_value::<TaskEnvelope>(json!({ "output": value }))
            .unwrap()
            .output
    }

    #[test]
    fn reads_video_and_image_results() {
        assert_eq!(
            task_status(output(json!({"task_status": "SUCCEEDED", "video_url": "https://v/1.mp4"}))),
            TaskStatus::Succeeded {
                url: "https://v/1.mp4".to_string()
            }
        );
        assert_eq!(
            task_status(output(json!({
                "task_status": "SUCCEEDED",
                "results": [{"code": "DataInspectionFailed"}, {"url": "https://i/1.png"}]
            }))),
            TaskStatus::Succeeded {
                url: "https://i/1.png".to_string()
            }
        );
    }

    #[test]
    fn maps_terminal_and_running_states() {
        assert_eq!(
            task_status(output(json!({"task_status": "RUNNING"}))),
            TaskStatus::Pending
        );
        assert_eq!(
            task_status(output(json!({"task_status": "FAILED", "message": "quota"}))),
            TaskStatus::Failed {
                reason: "quota".to_string()
            }
        );
        assert!(matches!(
            task_status(output(json!({"task_status": "SUCCEEDED"}))),
            TaskStatus::Failed { .. }
        ));
    }
}
