// Tests for ModelClient retry, validation and accounting behavior.
//
// Backoff sleeps run on a paused Tokio clock, so the full default
// schedule completes instantly.

mod test_utils;

use reel_core::Attachments;
use reel_error::{ModelError, ModelErrorKind, ReelErrorKind};
use reel_interface::{LanguageModel, SchemaCheck};
use reel_model::{ModelClient, RetryPolicy};
use serde_json::Value;
use std::time::Duration;
use test_utils::{MockBackend, MockResponse};

fn unavailable() -> ModelErrorKind {
    ModelErrorKind::HttpStatus {
        status_code: 503,
        message: "overloaded".to_string(),
        retry_after_ms: None,
    }
}

fn model_error(err: &reel_error::ReelError) -> &ModelError {
    match err.kind() {
        ReelErrorKind::Model(e) => e,
        other => panic!("expected model error, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausts_after_max_retries_plus_one() -> anyhow::Result<()> {
    let client = ModelClient::new("planner", "mock", MockBackend::new_error(unavailable()));

    let err = client
        .invoke("plan the video", &Attachments::none(), None)
        .await
        .unwrap_err();

    assert_eq!(client.backend().call_count(), 6);
    assert!(matches!(
        model_error(&err).kind,
        ModelErrorKind::ExhaustedRetries { attempts: 6, .. }
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() -> anyhow::Result<()> {
    let backend = MockBackend::new_fail_then_succeed(
        2,
        ModelErrorKind::Transport("connection reset".into()),
        "done",
    );
    let client = ModelClient::new("planner", "mock", backend).with_seed(3);

    let text = client.invoke("go", &Attachments::none(), None).await?;

    assert_eq!(text, "done");
    assert_eq!(client.backend().call_count(), 3);
    assert_eq!(client.usage().requests, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_at_least_the_computed_delays() -> anyhow::Result<()> {
    let backend = MockBackend::new_fail_then_succeed(2, unavailable(), "ok");
    let policy = RetryPolicy::new(5, Duration::from_secs(3), 2.0, false);
    let client = ModelClient::new("evaluator", "mock", backend).with_retry_policy(policy);

    let start = tokio::time::Instant::now();
    client.invoke("go", &Attachments::none(), None).await?;

    // 6s before the second attempt, 12s before the third.
    assert!(start.elapsed() >= Duration::from_secs(18));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recommended_delay_replaces_backoff() -> anyhow::Result<()> {
    let backend = MockBackend::new_fail_then_succeed(
        1,
        ModelErrorKind::HttpStatus {
            status_code: 429,
            message: "slow down".into(),
            retry_after_ms: Some(500),
        },
        "ok",
    );
    let policy = RetryPolicy::new(5, Duration::from_secs(3), 2.0, false);
    let client = ModelClient::new("evaluator", "mock", backend).with_retry_policy(policy);

    let start = tokio::time::Instant::now();
    client.invoke("go", &Attachments::none(), None).await?;

    assert!(start.elapsed() < Duration::from_secs(6));
    assert!(start.elapsed() >= Duration::from_millis(500));
    Ok(())
}

#[tokio::test]
async fn test_permanent_error_fails_immediately() -> anyhow::Result<()> {
    let backend = MockBackend::new_error(ModelErrorKind::HttpStatus {
        status_code: 401,
        message: "bad key".into(),
        retry_after_ms: None,
    });
    let client = ModelClient::new("artist", "mock", backend);

    let err = client
        .invoke("draw", &Attachments::none(), None)
        .await
        .unwrap_err();

    assert_eq!(client.backend().call_count(), 1);
    assert!(matches!(
        model_error(&err).kind,
        ModelErrorKind::HttpStatus { status_code: 401, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_without_calling() -> anyhow::Result<()> {
    let client = ModelClient::new("planner", "mock", MockBackend::new_success("x"));

    let err = client
        .invoke("   ", &Attachments::none(), None)
        .await
        .unwrap_err();

    assert_eq!(model_error(&err).kind, ModelErrorKind::EmptyPrompt);
    assert_eq!(client.backend().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_output_is_requeried() -> anyhow::Result<()> {
    let backend = MockBackend::new_sequence(vec![
        MockResponse::Success("I'd rather chat about it.".into()),
        MockResponse::Success("```json\n{\"style\": 3}\n```".into()),
        MockResponse::Success("```json\n{\"style\": \"Slides\"}\n```".into()),
    ]);
    let client = ModelClient::new("planner", "mock", backend);
    let check: &SchemaCheck = &|value: &Value| -> Result<(), String> {
        value["style"]
            .as_str()
            .map(|_| ())
            .ok_or_else(|| "style must be a string".to_string())
    };

    let text = client
        .invoke("plan", &Attachments::none(), Some(check))
        .await?;

    assert!(text.contains("Slides"));
    assert_eq!(client.backend().call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_invalid_output_budget_is_terminal() -> anyhow::Result<()> {
    let client = ModelClient::new("planner", "mock", MockBackend::new_success("no json here"))
        .with_retry_policy(RetryPolicy::new(2, Duration::ZERO, 2.0, false));
    let check: &SchemaCheck = &|_: &Value| -> Result<(), String> { Ok(()) };

    let err = client
        .invoke("plan", &Attachments::none(), Some(check))
        .await
        .unwrap_err();

    assert_eq!(client.backend().call_count(), 3);
    assert!(matches!(
        model_error(&err).kind,
        ModelErrorKind::InvalidOutput { attempts: 3, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_system_message_attached_every_call() -> anyhow::Result<()> {
    let client = ModelClient::new("planner", "mock", MockBackend::new_success("ok"))
        .with_system_message("You are a careful planner.");

    client.invoke("first", &Attachments::none(), None).await?;
    client.invoke("second", &Attachments::none(), None).await?;

    let requests = client.backend().requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(
            request.system().as_deref(),
            Some("You are a careful planner.")
        );
    }
    assert_eq!(requests[1].prompt(), "second");
    Ok(())
}
