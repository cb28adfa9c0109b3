//! Scripted language model for testing.

use async_trait::async_trait;
use reel_core::Attachments;
use reel_error::ReelResult;
use reel_interface::{LanguageModel, SchemaCheck};
use std::sync::{Arc, Mutex};

/// Produces a reply from the prompt and the number of earlier calls.
pub type Responder = dyn Fn(&str, usize) -> String + Send + Sync;

/// Language model that answers through a closure and records every prompt.
pub struct MockModel {
    role: String,
    responder: Box<Responder>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    /// Model answering every prompt with the same text.
    pub fn constant(role: &str, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(role, move |_, _| reply.clone())
    }

    /// Model answering through `responder`.
    pub fn new(role: &str, responder: impl Fn(&str, usize) -> String + Send + Sync + 'static) -> Self {
        Self {
            role: role.to_string(),
            responder: Box::new(responder),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn invoke(
        &self,
        prompt: &str,
        _attachments: &Attachments,
        _schema_check: Option<&SchemaCheck>,
    ) -> ReelResult<String> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        Ok((self.responder)(prompt, count))
    }

    fn role(&self) -> &str {
        &self.role
    }
}
