//! Mock model backend for testing.

use async_trait::async_trait;
use reel_core::{ModelReply, ModelRequest};
use reel_error::{ModelError, ModelErrorKind};
use reel_interface::ModelBackend;
use std::sync::{Arc, Mutex};

/// Behavior configuration for mock responses.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always return success with the given text
    Success(String),
    /// Always return the specified error
    Error(ModelErrorKind),
    /// Fail N times with the error, then succeed with the text
    FailThenSucceed {
        fail_count: usize,
        error: ModelErrorKind,
        success_text: String,
    },
    /// Return a sequence of responses; the last one repeats
    Sequence(Vec<MockResponse>),
}

/// A single mock response (success or error).
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Error(ModelErrorKind),
}

/// Mock backend that records every request it receives.
pub struct MockBackend {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl MockBackend {
    /// Create a mock backend that always succeeds with the given text.
    pub fn new_success(text: impl Into<String>) -> Self {
        Self::new_with_behavior(MockBehavior::Success(text.into()))
    }

    /// Create a mock backend that always fails with the given error.
    pub fn new_error(error: ModelErrorKind) -> Self {
        Self::new_with_behavior(MockBehavior::Error(error))
    }

    /// Create a mock backend that fails N times, then succeeds.
    pub fn new_fail_then_succeed(
        fail_count: usize,
        error: ModelErrorKind,
        success_text: impl Into<String>,
    ) -> Self {
        Self::new_with_behavior(MockBehavior::FailThenSucceed {
            fail_count,
            error,
            success_text: success_text.into(),
        })
    }

    /// Create a mock backend with a sequence of responses.
    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        Self::new_with_behavior(MockBehavior::Sequence(responses))
    }

    /// Create a mock backend with custom behavior.
    pub fn new_with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times send() was called.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(response: &MockResponse) -> Result<ModelReply, ModelError> {
        match response {
            MockResponse::Success(text) => Ok(ModelReply::text(text.clone())),
            MockResponse::Error(kind) => Err(ModelError::new(kind.clone())),
        }
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn send(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let current = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        match &self.behavior {
            MockBehavior::Success(text) => Ok(ModelReply::text(text.clone())),
            MockBehavior::Error(kind) => Err(ModelError::new(kind.clone())),
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success_text,
            } => {
                if current < *fail_count {
                    Err(ModelError::new(error.clone()))
                } else {
                    Ok(ModelReply::text(success_text.clone()))
                }
            }
            MockBehavior::Sequence(responses) => {
                let index = current.min(responses.len().saturating_sub(1));
                match responses.get(index) {
                    Some(response) => Self::respond(response),
                    None => Err(ModelError::new(ModelErrorKind::Transport(
                        "empty mock sequence".to_string(),
                    ))),
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
