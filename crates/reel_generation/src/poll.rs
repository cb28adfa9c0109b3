//! Fixed-interval polling of long-running media tasks.

use reel_error::{GenerationError, GenerationErrorKind, ReelResult};
use reel_interface::TaskStatus;
use std::future::Future;
use std::time::Duration;

/// Poll `task_id` every `interval` until it succeeds, fails, or `timeout`
/// elapses. Returns the result URL.
///
/// A poll that errors is logged and retried on the next tick; only the
/// timeout ends the wait early.
///
/// # Errors
///
/// Returns `TaskFailed` when the service reports failure and `TaskTimeout`
/// when the deadline passes first.
#[tracing::instrument(skip(poll))]
pub async fn wait_for_task<F, Fut>(
    task_id: &str,
    interval: Duration,
    timeout: Duration,
    mut poll: F,
) -> ReelResult<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ReelResult<TaskStatus>>,
{
    let waiting = async {
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            match poll().await {
                Ok(TaskStatus::Succeeded { url }) => {
                    tracing::info!(polls, "Media task finished");
                    return Ok(url);
                }
                Ok(TaskStatus::Failed { reason }) => {
                    return Err(GenerationError::new(GenerationErrorKind::TaskFailed {
                        task_id: task_id.to_string(),
                        reason,
                    })
                    .into());
                }
                Ok(TaskStatus::Pending) => {
                    tracing::debug!(polls, "Media task pending");
                }
                Err(e) => {
                    tracing::warn!(polls, error = %e, "Media task poll failed, will retry");
                }
            }
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(timeout, waiting).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::new(GenerationErrorKind::TaskTimeout {
            task_id: task_id.to_string(),
            seconds: timeout.as_secs(),
        })
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_error::{HttpError, ReelErrorKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn survives_poll_errors_until_success() {
        let calls = AtomicU32::new(0);
        let url = wait_for_task("t-1", Duration::from_secs(5), Duration::from_secs(60), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Ok(TaskStatus::Pending),
                    1 => Err(HttpError::new("connection reset").into()),
                    _ => Ok(TaskStatus::Succeeded {
                        url: "https://cdn.example/v.mp4".to_string(),
                    }),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(url, "https://cdn.example/v.mp4");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_while_pending() {
        let err = wait_for_task("t-2", Duration::from_secs(10), Duration::from_secs(35), || async {
            Ok(TaskStatus::Pending)
        })
        .await
        .unwrap_err();
        match err.kind() {
            ReelErrorKind::Generation(e) => assert_eq!(
                e.kind,
                GenerationErrorKind::TaskTimeout {
                    task_id: "t-2".to_string(),
                    seconds: 35
                }
            ),
            other => panic!("expected generation error, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_failure() {
        let err = wait_for_task("t-3", Duration::from_secs(1), Duration::from_secs(10), || async {
            Ok(TaskStatus::Failed {
                reason: "content policy".to_string(),
            })
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("content policy"));
    }
}
