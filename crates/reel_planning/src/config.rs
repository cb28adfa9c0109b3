//! Planning loop configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Budgets and switches for high- and low-level planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct PlanningConfig {
    /// Draft/evaluate rounds for scene decomposition
    #[serde(default = "default_max_high_iterations")]
    max_high_iterations: u32,

    /// Drafts allowed per scene in the field gate
    #[serde(default = "default_max_low_iterations")]
    max_low_iterations: u32,

    /// Whether evaluator feedback drives refinement at all
    #[serde(default = "default_enabled", rename = "with_reflection")]
    reflection: bool,

    /// Whether worked examples are appended to first drafts
    #[serde(default = "default_enabled", rename = "with_examples")]
    examples: bool,

    /// JSON file holding the example library
    #[serde(default)]
    #[setters(strip_option, into)]
    examples_path: Option<PathBuf>,
}

fn default_max_high_iterations() -> u32 {
    15
}

fn default_max_low_iterations() -> u32 {
    30
}

fn default_enabled() -> bool {
    true
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_high_iterations: default_max_high_iterations(),
            max_low_iterations: default_max_low_iterations(),
            reflection: default_enabled(),
            examples: default_enabled(),
            examples_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: PlanningConfig = serde_json::from_str(r#"{"with_examples": false}"#).unwrap();
        assert_eq!(*config.max_high_iterations(), 15);
        assert_eq!(*config.max_low_iterations(), 30);
        assert!(*config.reflection());
        assert!(!*config.examples());
        assert!(config.examples_path().is_none());
    }
}
