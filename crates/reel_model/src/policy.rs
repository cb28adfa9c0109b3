//! Retry budget and backoff schedule.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport retry budget for one model call.
///
/// A call makes at most `max_retries + 1` attempts. Before retry `n` the
/// client sleeps `initial_delay * Π(exp_base * (1 + jitter * r_k))` with
/// `r_k` drawn from `[0, 1)`, unless the failing service recommended a wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    /// Starting delay in seconds
    initial_delay_secs: f64,
    /// Growth factor per retry
    exp_base: f64,
    /// Whether to apply random jitter
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_secs: 3.0,
            exp_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy with explicit parameters.
    pub fn new(max_retries: u32, initial_delay: Duration, exp_base: f64, jitter: bool) -> Self {
        Self {
            max_retries,
            initial_delay_secs: initial_delay.as_secs_f64(),
            exp_base,
            jitter,
        }
    }

    /// Total attempts a call may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Checks the parameters keep the schedule finite and non-decreasing.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid parameter.
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_delay_secs.is_finite() || self.initial_delay_secs < 0.0 {
            return Err(format!(
                "initial_delay_secs must be a non-negative number, got {}",
                self.initial_delay_secs
            ));
        }
        if !self.exp_base.is_finite() || self.exp_base < 1.0 {
            return Err(format!("exp_base must be at least 1.0, got {}", self.exp_base));
        }
        Ok(())
    }

    /// Delay schedule for one call, jittered from `seed`.
    pub fn schedule(&self, seed: u64) -> Backoff {
        Backoff {
            delay_secs: self.initial_delay_secs,
            exp_base: self.exp_base,
            jitter: self.jitter,
            remaining: self.max_retries,
            rng: StdRng::seed_from_u64(seed),
            recommended: RecommendedDelay::default(),
        }
    }
}

/// Slot through which a failed attempt passes the service's recommended
/// wait to the schedule.
#[derive(Debug, Clone, Default)]
pub struct RecommendedDelay(Arc<Mutex<Option<Duration>>>);

impl RecommendedDelay {
    /// Record the wait to use before the next attempt.
    pub fn set(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = delay;
        }
    }

    fn take(&self) -> Option<Duration> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Iterator of delays between attempts; yields `max_retries` items.
///
/// A recommended delay replaces the computed one for a single retry and
/// leaves the exponential progression where it was.
#[derive(Debug)]
pub struct Backoff {
    delay_secs: f64,
    exp_base: f64,
    jitter: bool,
    remaining: u32,
    rng: StdRng,
    recommended: RecommendedDelay,
}

impl Backoff {
    /// Handle for injecting recommended delays.
    pub fn recommended(&self) -> RecommendedDelay {
        self.recommended.clone()
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if let Some(delay) = self.recommended.take() {
            return Some(delay);
        }
        let spread = if self.jitter {
            1.0 + self.rng.gen_range(0.0..1.0)
        } else {
            1.0
        };
        self.delay_secs *= self.exp_base * spread;
        Some(Duration::try_from_secs_f64(self.delay_secs).unwrap_or_default())
    }
}
