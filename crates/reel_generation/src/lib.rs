//! Media generation for planned scenes.
//!
//! [`GenerationDispatcher`] routes each accepted [`reel_core::ScenePlan`] by
//! style:
//!
//! - General: diffusion video judged on key frames
//! - Professional: animation code or a molecule turntable
//! - Slides: a document figure or table under a refined caption
//! - Captioning: a diffusion still under its caption
//! - Talking head: a presenter avatar reading the narration
//!
//! Every route ends in a narrated, time-aligned segment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod contract;
mod dispatcher;
mod poll;
pub mod prompts;
mod routes;
mod services;

pub use config::GenerationConfig;
pub use contract::{MAX_CODE_LINES, check_code};
pub use dispatcher::GenerationDispatcher;
pub use poll::wait_for_task;
pub use services::{Services, ServicesBuilder};
