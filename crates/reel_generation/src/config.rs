//! Generation loop configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Budgets and timing for scene generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GenerationConfig {
    /// Generate/evaluate rounds per visual
    #[serde(default = "default_max_generate_iterations")]
    max_generate_iterations: u32,

    /// Code repairs allowed per render or contract check
    #[serde(default = "default_max_render_repairs")]
    max_render_repairs: u32,

    /// Seconds between media task polls
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,

    /// Seconds before a media task is abandoned
    #[serde(default = "default_task_timeout_secs")]
    task_timeout_secs: u64,

    /// Budget used when a plan's time_cost has no number in it
    #[serde(default = "default_time_cost_secs")]
    default_time_cost_secs: f64,
}

fn default_max_generate_iterations() -> u32 {
    10
}

fn default_max_render_repairs() -> u32 {
    5
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_task_timeout_secs() -> u64 {
    900
}

fn default_time_cost_secs() -> f64 {
    reel_core::DEFAULT_TIME_BUDGET_SECS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_generate_iterations: default_max_generate_iterations(),
            max_render_repairs: default_max_render_repairs(),
            poll_interval_secs: default_poll_interval_secs(),
            task_timeout_secs: default_task_timeout_secs(),
            default_time_cost_secs: default_time_cost_secs(),
        }
    }
}

impl GenerationConfig {
    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Task timeout as a duration.
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Seconds budgeted for a scene, from its free-text time cost.
    pub fn time_budget(&self, time_cost: &str) -> f64 {
        if time_cost.chars().any(|c| c.is_ascii_digit()) {
            reel_core::parse_time_budget(time_cost)
        } else {
            self.default_time_cost_secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_budget_falls_back_to_default() {
        let config = GenerationConfig::default().with_default_time_cost_secs(6.0);
        assert_eq!(config.time_budget("about 12.5 seconds"), 12.5);
        assert_eq!(config.time_budget("short"), 6.0);
    }
}
