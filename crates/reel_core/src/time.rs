//! Time budget parsing.

use regex::Regex;
use std::sync::OnceLock;

/// Seconds used when a time budget names no number.
pub const DEFAULT_TIME_BUDGET_SECS: f64 = 8.0;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"))
}

/// Reads the first number in a free-text time budget.
///
/// # Examples
///
/// ```
/// use reel_core::parse_time_budget;
///
/// assert_eq!(parse_time_budget("About 12 seconds"), 12.0);
/// assert_eq!(parse_time_budget("7.5s"), 7.5);
/// assert_eq!(parse_time_budget("short"), 8.0);
/// ```
pub fn parse_time_budget(text: &str) -> f64 {
    number_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|secs| *secs > 0.0)
        .unwrap_or(DEFAULT_TIME_BUDGET_SECS)
}
