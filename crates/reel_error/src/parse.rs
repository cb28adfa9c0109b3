//! Structured-output extraction errors.

/// Raised when no extraction strategy recovers a value from model text.
///
/// Carries the offending text so callers can log or re-query with it.
///
/// # Examples
///
/// ```
/// use reel_error::ParseError;
///
/// let err = ParseError::new("no JSON value found", "I cannot help with that");
/// assert_eq!(err.text, "I cannot help with that");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} (input: {:?}) at line {} in {}", message, preview, line, file)]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// The full offending text
    pub text: String,
    /// First 100 characters of the text
    pub preview: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>, text: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        let text = text.into();
        let preview = text.chars().take(100).collect();
        Self {
            message: message.into(),
            text,
            preview,
            line: location.line(),
            file: location.file(),
        }
    }
}
