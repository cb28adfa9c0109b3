//! Model invocation errors and retry classification.

use std::time::Duration;

/// Model invocation error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ModelErrorKind {
    /// Prompt was empty or whitespace
    #[display("Prompt must not be empty")]
    EmptyPrompt,
    /// API key not found in environment
    #[display("Credentials not found: environment variable {} is not set", _0)]
    MissingCredentials(String),
    /// Connection-level failure before a response was received
    #[display("Model transport failed: {}", _0)]
    Transport(String),
    /// Service answered with a non-success status
    #[display("HTTP {} error: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
        /// Wait time recommended by the service, in milliseconds
        retry_after_ms: Option<u64>,
    },
    /// Request could not be assembled or was refused as malformed
    #[display("Invalid model request: {}", _0)]
    InvalidRequest(String),
    /// Service answered with a body that could not be read
    #[display("Malformed model response: {}", _0)]
    MalformedResponse(String),
    /// Transport retry budget spent
    #[display("Too many errors: gave up after {} attempts ({})", attempts, last)]
    ExhaustedRetries {
        /// Number of attempts made
        attempts: u32,
        /// Last transport error
        last: String,
    },
    /// Every re-query produced text that failed the schema check
    #[display("Invalid output after {} attempts: {}", attempts, reason)]
    InvalidOutput {
        /// Number of attempts made
        attempts: u32,
        /// Last validation failure
        reason: String,
    },
}

impl ModelErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelErrorKind::HttpStatus { status_code, .. } => {
                matches!(*status_code, 408 | 409 | 429 | 500 | 502 | 503 | 504)
            }
            ModelErrorKind::Transport(_) => true,
            ModelErrorKind::MalformedResponse(_) => true,
            _ => false,
        }
    }

    /// Wait time the service asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ModelErrorKind::HttpStatus {
                retry_after_ms: Some(ms),
                ..
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

/// Model error with source location tracking.
///
/// # Examples
///
/// ```
/// use reel_error::{ModelError, ModelErrorKind, RetryableError};
///
/// let err = ModelError::new(ModelErrorKind::HttpStatus {
///     status_code: 429,
///     message: "slow down".to_string(),
///     retry_after_ms: Some(1500),
/// });
/// assert!(err.is_retryable());
/// assert_eq!(err.retry_after(), Some(std::time::Duration::from_millis(1500)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Model Error: {} at line {} in {}", kind, line, file)]
pub struct ModelError {
    /// The kind of error that occurred
    pub kind: ModelErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ModelError {
    /// Create a new ModelError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ModelErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors (timeouts, 429, 5xx) report `true`; permanent errors
/// such as authentication failures or malformed requests report `false`
/// and fail the call immediately.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Wait time the failing service recommended before the next attempt.
    ///
    /// When present it replaces the computed backoff for one attempt only.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for ModelError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.kind.retry_after()
    }
}
