//! Rendering styles.

use reel_error::{GenerationError, GenerationErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rendering strategy for one scene.
///
/// Parsing is case-insensitive and matches on the keywords planners
/// actually emit ("Professional", "scientific visualization", "Slides",
/// "Captioning", "Talking head"). Unknown text is an error, never a
/// fallback.
///
/// # Examples
///
/// ```
/// use reel_core::Style;
///
/// assert_eq!("Scientific visualization".parse::<Style>().unwrap(), Style::Professional);
/// assert_eq!("TALKING HEAD".parse::<Style>().unwrap(), Style::TalkingHead);
/// assert!("watercolor".parse::<Style>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum Style {
    /// Text-to-video generation
    #[display("General")]
    General,
    /// Scientific visualization: animation code or molecular rendering
    #[display("Professional")]
    Professional,
    /// Figure or table lifted from the document onto a slide
    #[display("Slides")]
    Slides,
    /// Generated still image with caption
    #[display("Captioning")]
    Captioning,
    /// Presenter avatar reading the narration
    #[display("Talking-head")]
    TalkingHead,
}

impl Style {
    /// True for styles whose plan must name a concrete source locator.
    pub fn needs_source(&self) -> bool {
        matches!(self, Style::Slides | Style::Professional)
    }
}

impl FromStr for Style {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        if has(&["general"]) {
            Ok(Style::General)
        } else if has(&["prof", "scie", "math", "mol"]) {
            Ok(Style::Professional)
        } else if has(&["cap"]) {
            Ok(Style::Captioning)
        } else if has(&["slide"]) {
            Ok(Style::Slides)
        } else if has(&["head", "talking"]) {
            Ok(Style::TalkingHead)
        } else {
            Err(GenerationError::new(GenerationErrorKind::UnknownStyle(
                s.to_string(),
            )))
        }
    }
}

/// Sub-route of a professional scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum ProfessionalKind {
    /// Mathematical animation rendered from generated code
    #[display("math")]
    Math,
    /// Molecular structure turntable
    #[display("mol")]
    Molecule,
}

impl ProfessionalKind {
    /// Reads a classifier answer; anything not naming a molecule is math.
    pub fn from_answer(answer: &str) -> Self {
        if answer.to_lowercase().contains("mol") {
            ProfessionalKind::Molecule
        } else {
            ProfessionalKind::Math
        }
    }
}
