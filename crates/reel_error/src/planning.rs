//! Planning error types.

/// Specific error conditions for scene planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlanningErrorKind {
    /// High-level decomposition produced no scenes
    #[display("Scene decomposition produced no scenes")]
    NoScenes,
    /// Scene index outside the decomposed plan
    #[display("Scene {} is out of range for a plan of {} scenes", index, len)]
    SceneOutOfRange {
        /// Requested index
        index: usize,
        /// Number of scenes in the plan
        len: usize,
    },
    /// Required plan field missing after planning finished
    #[display("Scene {} plan is missing field '{}'", scene, field)]
    MissingField {
        /// Scene index
        scene: usize,
        /// Field name
        field: String,
    },
    /// Example library could not be loaded
    #[display("Failed to load examples: {}", _0)]
    Examples(String),
}

/// Error type for planning operations.
///
/// # Examples
///
/// ```
/// use reel_error::{PlanningError, PlanningErrorKind};
///
/// let err = PlanningError::new(PlanningErrorKind::NoScenes);
/// assert!(format!("{}", err).contains("no scenes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Planning Error: {} at line {} in {}", kind, line, file)]
pub struct PlanningError {
    /// The kind of error that occurred
    pub kind: PlanningErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlanningError {
    /// Create a new PlanningError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlanningErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
