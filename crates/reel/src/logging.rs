//! Subscriber setup: console output plus the per-document log files.

use reel_error::{ConfigError, ReelResult, StorageError, StorageErrorKind};
use reel_model::TRANSCRIPT_TARGET;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, Metadata};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn open_log(path: &Path) -> ReelResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
                .into()
        })
}

fn is_transcript(metadata: &Metadata<'_>) -> bool {
    metadata.target() == TRANSCRIPT_TARGET
}

/// Console filter: `RUST_LOG` wins, otherwise `info` (or `debug` with
/// `verbose`). Transcript bodies never reach the console.
fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(format!("debug,{}=off", TRANSCRIPT_TARGET))
        } else {
            EnvFilter::new(format!("info,{}=off", TRANSCRIPT_TARGET))
        }
    })
}

/// Install the global subscriber.
///
/// The workflow log receives info-and-above events from everything except
/// the transcript; the transcript log receives only transcript events.
///
/// # Errors
///
/// Returns error if a log file cannot be opened or a subscriber is already
/// installed.
pub fn init_logging(
    verbose: bool,
    workflow_log: Option<&Path>,
    transcript_log: Option<&Path>,
) -> ReelResult<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(console_filter(verbose));

    let workflow = match workflow_log {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log(path)?))
                .with_filter(filter_fn(|metadata| {
                    !is_transcript(metadata) && *metadata.level() <= Level::INFO
                })),
        ),
        None => None,
    };

    let transcript = match transcript_log {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(open_log(path)?))
                .with_filter(filter_fn(is_transcript)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(workflow)
        .with(transcript)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize logging: {}", e)).into())
}
