//! `run` and `plan` command handlers.

use super::Cli;
use super::commands::RunArgs;
use reel::services::HttpDownloader;
use reel::{Orchestrator, ReelConfig, build_services, init_logging};
use reel_core::DocumentRef;
use reel_error::{JsonError, ReelResult, StorageError, StorageErrorKind};
use reel_interface::Downloader;
use reel_planning::ExampleLibrary;
use reel_storage::{ArtifactKind, ArtifactStore};

/// Everything a command needs once configuration and logging are settled.
struct Session {
    config: ReelConfig,
    document: DocumentRef,
    store: ArtifactStore,
    high_plan: Option<String>,
}

/// Apply command-line overrides on top of the loaded configuration.
fn configure(cli: &Cli, args: &RunArgs) -> ReelResult<ReelConfig> {
    let mut config = ReelConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.no_reflection {
        let planning = config.planning().clone().with_reflection(false);
        config = config.with_planning(planning);
    }
    if args.no_examples {
        let planning = config.planning().clone().with_examples(false);
        config = config.with_planning(planning);
    }
    Ok(config)
}

/// Remote documents are fetched into the output root first; every later
/// stage works on the local copy.
async fn localize(config: &ReelConfig, document: DocumentRef) -> ReelResult<DocumentRef> {
    if !document.is_remote() {
        return Ok(document);
    }
    let extension = document.extension().unwrap_or_else(|| "pdf".to_string());
    let destination = config
        .output_dir()
        .join("downloads")
        .join(format!("{}.{}", document.id(), extension));
    if !tokio::fs::try_exists(&destination).await.unwrap_or(false) {
        HttpDownloader::new(reqwest::Client::new())
            .download(document.location(), &destination)
            .await?;
    }
    Ok(DocumentRef::new(destination.to_string_lossy()))
}

async fn open_session(cli: &Cli, args: &RunArgs) -> ReelResult<Session> {
    dotenvy::dotenv().ok();
    let config = configure(cli, args)?;
    let document = localize(&config, DocumentRef::new(&args.document)).await?;
    let store = ArtifactStore::open(config.output_dir(), document.id()).await?;

    let workflow = store.prepare(&ArtifactKind::WorkflowLog).await?;
    let transcript = store.prepare(&ArtifactKind::Transcript).await?;
    init_logging(cli.verbose, Some(&workflow), Some(&transcript))?;
    tracing::info!(document = %document, work_dir = %store.work_dir().display(), "Session opened");

    let high_plan = match &args.high_plan {
        Some(path) => Some(tokio::fs::read_to_string(path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?),
        None => None,
    };

    Ok(Session {
        config,
        document,
        store,
        high_plan,
    })
}

async fn orchestrator(config: &ReelConfig) -> ReelResult<Orchestrator> {
    let planning = config.planning();
    let mut orchestrator = Orchestrator::new(
        build_services(config)?,
        planning.clone(),
        config.generation().clone(),
    );
    if *planning.examples() {
        if let Some(path) = planning.examples_path() {
            let library = ExampleLibrary::load(path).await?.shuffled(*config.seed());
            orchestrator = orchestrator.with_examples(library);
        }
    }
    Ok(orchestrator)
}

fn print_json<T: serde::Serialize>(value: &T) -> ReelResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Run the full pipeline and print the run summary.
///
/// # Errors
///
/// Returns error on configuration, planning, generation or persistence
/// failure.
pub async fn run_document(cli: &Cli, args: &RunArgs) -> ReelResult<()> {
    let session = open_session(cli, args).await?;
    let summary = orchestrator(&session.config)
        .await?
        .run(&session.store, &session.document, session.high_plan.as_deref())
        .await?;
    print_json(&summary)
}

/// Plan the document and print the scene plans.
///
/// # Errors
///
/// Returns error on configuration, planning or persistence failure.
pub async fn plan_document(cli: &Cli, args: &RunArgs) -> ReelResult<()> {
    let session = open_session(cli, args).await?;
    let (_, plans) = orchestrator(&session.config)
        .await?
        .plan(&session.store, &session.document, session.high_plan.as_deref())
        .await?;
    print_json(&plans)
}
