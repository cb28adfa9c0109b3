//! Worked examples appended to first-draft prompts.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use reel_error::{PlanningError, PlanningErrorKind, ReelResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

/// Example library loaded from a JSON file.
///
/// ```json
/// {
///   "high_examples": [{"SCENE1": "...", "DESCRIPTION": "...", "TIME_ALLOCATION": "..."}],
///   "low_examples": [{"style": "Slides", "source": "Fig.2", "...": "..."}],
///   "animation_examples": ["def animate(self): ..."]
/// }
/// ```
///
/// Every key is optional. A single string or object is accepted where a
/// list is expected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, derive_getters::Getters)]
pub struct ExampleLibrary {
    #[serde(default, deserialize_with = "one_or_many")]
    high_examples: Vec<Value>,
    #[serde(default, deserialize_with = "one_or_many")]
    low_examples: Vec<Value>,
    #[serde(default, alias = "MANIM_examples", deserialize_with = "one_or_many")]
    animation_examples: Vec<Value>,
}

impl ExampleLibrary {
    /// Parse a library from JSON text.
    pub fn from_json(text: &str) -> Result<Self, PlanningError> {
        serde_json::from_str(text)
            .map_err(|e| PlanningError::new(PlanningErrorKind::Examples(e.to_string())))
    }

    /// Load a library from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid library.
    #[tracing::instrument]
    pub async fn load(path: &Path) -> ReelResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            PlanningError::new(PlanningErrorKind::Examples(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        let library = Self::from_json(&text)?;
        tracing::info!(
            high = library.high_examples.len(),
            low = library.low_examples.len(),
            animation = library.animation_examples.len(),
            "Loaded example library"
        );
        Ok(library)
    }

    /// Shuffle each list with a seeded RNG, so the same seed always
    /// presents examples in the same order.
    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        self.high_examples.shuffle(&mut rng);
        self.low_examples.shuffle(&mut rng);
        self.animation_examples.shuffle(&mut rng);
        self
    }

    /// High-level examples as prompt text.
    pub fn high_text(&self) -> String {
        render(&self.high_examples)
    }

    /// Low-level examples as prompt text.
    pub fn low_text(&self) -> String {
        render(&self.low_examples)
    }

    /// Animation code examples as prompt text.
    pub fn animation_text(&self) -> String {
        render(&self.animation_examples)
    }
}

/// One line per example; objects become `key: value` pairs.
fn render(examples: &[Value]) -> String {
    examples
        .iter()
        .map(|example| match example {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| match value {
                    Value::String(text) => format!("{}: {}", key, text),
                    other => format!("{}: {}", key, other),
                })
                .collect::<Vec<_>>()
                .join(" "),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}
