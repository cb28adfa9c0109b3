//! Top-level error wrapper types.

use crate::{
    ConfigError, GenerationError, GenerationErrorKind, HttpError, JsonError, ModelError,
    ParseError, PlanningError, StorageError,
};

/// Every error family raised by the pipeline.
///
/// # Examples
///
/// ```
/// use reel_error::{ReelError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: ReelError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model invocation error
    #[from(ModelError)]
    Model(ModelError),
    /// Structured-output extraction error
    #[from(ParseError)]
    Parse(ParseError),
    /// Planning error
    #[from(PlanningError)]
    Planning(PlanningError),
    /// Generation error
    #[from(GenerationError)]
    Generation(GenerationError),
}

/// Pipeline error with kind discrimination.
///
/// # Examples
///
/// ```
/// use reel_error::{ConfigError, ReelResult};
///
/// fn might_fail() -> ReelResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reel Error: {}", _0)]
pub struct ReelError(Box<ReelErrorKind>);

impl ReelError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelErrorKind {
        &self.0
    }

    /// True when a scene needs a human-supplied asset.
    ///
    /// The orchestrator skips such scenes instead of aborting the run.
    pub fn is_manual_intervention(&self) -> bool {
        matches!(
            self.kind(),
            ReelErrorKind::Generation(GenerationError {
                kind: GenerationErrorKind::ManualIntervention(_),
                ..
            })
        )
    }
}

// Generic From implementation for any type that converts to ReelErrorKind
impl<T> From<T> for ReelError
where
    T: Into<ReelErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for pipeline operations.
pub type ReelResult<T> = std::result::Result<T, ReelError>;
