//! Tavus presenter-avatar videos.

use super::send_json;
use crate::config::{AvatarServiceConfig, secret};
use async_trait::async_trait;
use reel_error::{HttpError, ReelResult};
use reel_interface::{TalkingHeadService, TaskStatus};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Created {
    video_id: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoState {
    #[serde(default)]
    status: String,
    download_url: Option<String>,
    status_details: Option<String>,
}

/// Talking-head jobs driven by a narration audio URL.
pub struct TavusAvatar {
    client: reqwest::Client,
    config: AvatarServiceConfig,
    api_key: String,
}

impl TavusAvatar {
    /// Client using the key named in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key is not set.
    pub fn new(client: reqwest::Client, config: &AvatarServiceConfig) -> ReelResult<Self> {
        Ok(Self {
            client,
            api_key: secret(config.api_key_env())?,
            config: config.clone(),
        })
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.config.endpoint().trim_end_matches('/'))
    }
}

#[async_trait]
impl TalkingHeadService for TavusAvatar {
    #[tracing::instrument(skip(self, script))]
    async fn create_task(&self, audio_url: &str, script: &str) -> ReelResult<String> {
        let body = json!({
            "replica_id": self.config.replica_id(),
            "audio_url": audio_url,
            "video_name": script.chars().take(60).collect::<String>(),
        });
        let created: Created = send_json(
            self.client
                .post(self.videos_url())
                .header("x-api-key", &self.api_key)
                .json(&body),
        )
        .await?;
        created
            .video_id
            .or(created.id)
            .ok_or_else(|| HttpError::new("Avatar service returned no video id").into())
    }

    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus> {
        let state: VideoState = send_json(
            self.client
                .get(format!("{}/{}", self.videos_url(), task_id))
                .header("x-api-key", &self.api_key),
        )
        .await?;
        Ok(video_status(state))
    }
}

fn video_status(state: VideoState) -> TaskStatus {
    match state.status.to_lowercase().as_str() {
        "ready" => match state.download_url {
            Some(url) => TaskStatus::Succeeded { url },
            None => TaskStatus::Pending,
        },
        "failed" | "error" | "deleted" => TaskStatus::Failed {
            reason: state.status_details.unwrap_or(state.status),
        },
        _ => TaskStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(value: serde_json::Value) -> VideoState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ready_needs_a_download_url() {
        assert_eq!(
            video_status(state(json!({"status": "ready", "download_url": "https://t/v.mp4"}))),
            TaskStatus::Succeeded {
                url: "https://t/v.mp4".to_string()
            }
        );
        assert_eq!(video_status(state(json!({"status": "ready"}))), TaskStatus::Pending);
        assert_eq!(video_status(state(json!({"status": "generating"}))), TaskStatus::Pending);
        assert!(matches!(
            video_status(state(json!({"status": "error", "status_details": "bad audio"}))),
            TaskStatus::Failed { reason } if reason == "bad audio"
        ));
    }
}
