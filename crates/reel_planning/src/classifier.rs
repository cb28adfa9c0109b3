//! Reduce evaluator text to a [`Verdict`].

use reel_core::{Verdict, extract_structured};
use serde_json::Value;

/// Turns raw evaluator output into accept/reject plus feedback.
///
/// Planning and generation loops only ever see the [`Verdict`], so the
/// acceptance rule can be swapped without touching them.
pub trait VerdictClassifier: Send + Sync {
    /// Classify one evaluator response.
    fn classify(&self, response: &str) -> Verdict;
}

/// Accepts unless the response contains the rejection token.
///
/// The match is case-sensitive and not word-bounded: "NOTE" rejects and a
/// rationale that says "YES, but NO citation" rejects too.
///
/// # Examples
///
/// ```
/// use reel_planning::{RejectionTokenClassifier, VerdictClassifier};
///
/// let classifier = RejectionTokenClassifier::default();
/// assert!(classifier.classify("YES, the plan is fine").accepted);
/// assert!(!classifier.classify("NO. Scene 3 repeats scene 2").accepted);
/// ```
#[derive(Debug, Clone)]
pub struct RejectionTokenClassifier {
    token: String,
}

impl RejectionTokenClassifier {
    /// Classifier rejecting on a custom token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Default for RejectionTokenClassifier {
    fn default() -> Self {
        Self::new("NO")
    }
}

impl VerdictClassifier for RejectionTokenClassifier {
    fn classify(&self, response: &str) -> Verdict {
        if response.contains(&self.token) {
            Verdict::reject(response)
        } else {
            Verdict::accept(response)
        }
    }
}

/// Reads `{"accepted": bool, "feedback": "..."}` from the response.
///
/// `accepted` may also be a "YES"/"NO" string. Responses without a readable
/// verdict object fall back to [`RejectionTokenClassifier`].
#[derive(Debug, Clone, Default)]
pub struct StructuredVerdictClassifier {
    fallback: RejectionTokenClassifier,
}

impl VerdictClassifier for StructuredVerdictClassifier {
    fn classify(&self, response: &str) -> Verdict {
        let parsed = extract_structured(response)
            .ok()
            .and_then(|value| structured_verdict(&value));
        match parsed {
            Some(verdict) => verdict,
            None => {
                tracing::debug!("No structured verdict found, using rejection token");
                self.fallback.classify(response)
            }
        }
    }
}

fn structured_verdict(value: &Value) -> Option<Verdict> {
    let accepted = match value.get("accepted")? {
        Value::Bool(accepted) => *accepted,
        Value::String(answer) => answer.trim().eq_ignore_ascii_case("yes"),
        _ => return None,
    };
    let feedback = match value.get("feedback") {
        Some(Value::String(text)) => text.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => String::new(),
    };
    Some(Verdict { accepted, feedback })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_token_is_case_sensitive() {
        let classifier = RejectionTokenClassifier::default();
        assert!(classifier.classify("no problems found").accepted);
        assert!(!classifier.classify("NOTE: looks good").accepted);
    }

    #[test]
    fn structured_reads_bool_and_string_answers() {
        let classifier = StructuredVerdictClassifier::default();
        let verdict = classifier.classify(r#"```json
{"accepted": false, "feedback": "cite Table 2"}
```"#);
        assert!(!verdict.accepted);
        assert_eq!(verdict.feedback, "cite Table 2");

        assert!(classifier.classify(r#"{"accepted": "YES"}"#).accepted);
    }

    #[test]
    fn structured_falls_back_on_free_text() {
        let classifier = StructuredVerdictClassifier::default();
        assert!(classifier.classify("YES").accepted);
        let verdict = classifier.classify("NO, too long");
        assert!(!verdict.accepted);
        assert_eq!(verdict.feedback, "NO, too long");
    }
}
