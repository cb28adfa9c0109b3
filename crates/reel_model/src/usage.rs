//! Running request and token counters.

use reel_core::{ModelReply, ModelRequest, UsageSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};

/// Dollars per thousand prompt tokens used for the running estimate.
pub const PROMPT_COST_PER_1K: f64 = 0.01;
/// Dollars per thousand completion tokens used for the running estimate.
pub const COMPLETION_COST_PER_1K: f64 = 0.03;

/// Counters updated after every successful call. Informational only.
#[derive(Debug, Default)]
pub struct UsageCounter {
    requests: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl UsageCounter {
    /// Record one reply. Token counts the backend did not report are
    /// estimated from text length.
    pub fn record(&self, request: &ModelRequest, reply: &ModelReply) -> UsageSnapshot {
        let prompt = reply
            .prompt_tokens
            .unwrap_or_else(|| estimate_tokens(request.prompt()));
        let completion = reply
            .completion_tokens
            .unwrap_or_else(|| estimate_tokens(&reply.text));
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.snapshot()
    }

    /// Current totals.
    pub fn snapshot(&self) -> UsageSnapshot {
        let prompt_tokens = self.prompt_tokens.load(Ordering::Relaxed);
        let completion_tokens = self.completion_tokens.load(Ordering::Relaxed);
        UsageSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            prompt_tokens,
            completion_tokens,
            estimated_cost: prompt_tokens as f64 / 1000.0 * PROMPT_COST_PER_1K
                + completion_tokens as f64 / 1000.0 * COMPLETION_COST_PER_1K,
        }
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4).max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_tokens_drive_cost() {
        let counter = UsageCounter::default();
        let request = ModelRequest::builder()
            .model("m")
            .prompt("hello")
            .build()
            .unwrap();
        let reply = ModelReply {
            text: "hi".into(),
            prompt_tokens: Some(1000),
            completion_tokens: Some(2000),
        };
        let snapshot = counter.record(&request, &reply);
        assert_eq!(snapshot.requests, 1);
        assert!((snapshot.estimated_cost - 0.07).abs() < 1e-9);
    }

    #[test]
    fn missing_counts_are_estimated() {
        let counter = UsageCounter::default();
        let request = ModelRequest::builder()
            .model("m")
            .prompt("a".repeat(400))
            .build()
            .unwrap();
        counter.record(&request, &ModelReply::text("b".repeat(40)));
        let snapshot = counter.snapshot();
        assert_eq!(snapshot.prompt_tokens, 100);
        assert_eq!(snapshot.completion_tokens, 10);
    }
}
