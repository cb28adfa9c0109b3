//! Turns research documents into narrated explainer videos.
//!
//! The [`Orchestrator`] decomposes a document into scenes, plans each scene
//! through the field gate, generates every segment with the route its style
//! selects, and concatenates the result. Configuration is layered TOML
//! ([`ReelConfig`]); [`build_services`] wires the HTTP services and local
//! tools the pipeline calls.
//!
//! # Example
//!
//! ```no_run
//! use reel::{Orchestrator, ReelConfig, build_services};
//! use reel_core::DocumentRef;
//! use reel_storage::ArtifactStore;
//!
//! # async fn example() -> reel_error::ReelResult<()> {
//! let config = ReelConfig::load(None)?;
//! let document = DocumentRef::new("papers/attention.pdf");
//! let store = ArtifactStore::open(config.output_dir(), document.id()).await?;
//! let orchestrator = Orchestrator::new(
//!     build_services(&config)?,
//!     config.planning().clone(),
//!     config.generation().clone(),
//! );
//! let summary = orchestrator.run(&store, &document, None).await?;
//! println!("{:?}", summary.final_video());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod logging;
mod orchestrator;
pub mod services;

pub use config::{
    AvatarServiceConfig, MediaServiceConfig, ModelRoleConfig, ModelsConfig, ReelConfig,
    RenderConfig, ServicesConfig, SpeechServiceConfig, StructureServiceConfig, secret,
};
pub use logging::init_logging;
pub use orchestrator::{Orchestrator, RunSummary};
pub use services::build_services;
