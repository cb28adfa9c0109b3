//! Media generation error types.

/// Specific error conditions for scene generation routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Style field did not name a known rendering style
    #[display("Unknown style: '{}'", _0)]
    UnknownStyle(String),
    /// Structure lookup found nothing; a human has to supply the asset
    #[display("Manual intervention required: no structure found for '{}'", _0)]
    ManualIntervention(String),
    /// Remote media task reported failure
    #[display("Media task {} failed: {}", task_id, reason)]
    TaskFailed {
        /// Service task identifier
        task_id: String,
        /// Failure reason reported by the service
        reason: String,
    },
    /// Remote media task did not finish in time
    #[display("Media task {} timed out after {}s", task_id, seconds)]
    TaskTimeout {
        /// Service task identifier
        task_id: String,
        /// Elapsed seconds
        seconds: u64,
    },
    /// Animation code kept failing to render
    #[display("Rendering failed after {} repair attempts: {}", attempts, last)]
    RenderExhausted {
        /// Repairs attempted
        attempts: u32,
        /// Last render error
        last: String,
    },
    /// Animation code could not be brought into the required shape
    #[display("Code contract violated: {}", _0)]
    ContractViolation(String),
    /// External media tool failed
    #[display("Media tool failed: {}", _0)]
    Media(String),
    /// Document asset could not be located
    #[display("Document asset not found: {}", _0)]
    MissingAsset(String),
}

/// Error type for generation operations.
///
/// # Examples
///
/// ```
/// use reel_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::UnknownStyle("Watercolor".into()));
/// assert!(format!("{}", err).contains("Watercolor"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
