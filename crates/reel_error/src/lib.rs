//! Error types for the reel pipeline.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use reel_error::{ReelResult, StorageError, StorageErrorKind};
//!
//! fn load_plan() -> ReelResult<String> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("logs/highplan.json".into())))?
//! }
//!
//! assert!(load_plan().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod http;
mod json;
mod model;
mod parse;
mod planning;
mod storage;

pub use config::ConfigError;
pub use error::{ReelError, ReelErrorKind, ReelResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use http::HttpError;
pub use json::JsonError;
pub use model::{ModelError, ModelErrorKind, RetryableError};
pub use parse::ParseError;
pub use planning::{PlanningError, PlanningErrorKind};
pub use storage::{StorageError, StorageErrorKind};
