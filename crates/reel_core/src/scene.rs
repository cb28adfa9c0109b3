//! High-level scene descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One narrative beat of the output video.
///
/// Ordering within a plan is meaningful and fixed once produced; the
/// position in the list is the scene index used to join descriptors,
/// plans and segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct SceneDescriptor {
    /// Short scene title
    label: String,
    /// What the scene covers
    description: String,
    /// Free-text time budget, e.g. "10 seconds"
    time_allocation: String,
}

impl SceneDescriptor {
    /// Creates a descriptor.
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        time_allocation: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            time_allocation: time_allocation.into(),
        }
    }

    /// Reads one record of the formatted high-level plan.
    ///
    /// Records look like `{"SCENE1": "...", "DESCRIPTION": "...",
    /// "TIME_ALLOCATION": "..."}`; key case is ignored and the persisted
    /// `label`/`description`/`time_allocation` keys are accepted too.
    /// Returns `None` when the record is not an object or has no
    /// description.
    ///
    /// # Examples
    ///
    /// ```
    /// use reel_core::SceneDescriptor;
    /// use serde_json::json;
    ///
    /// let record = json!({
    ///     "SCENE1": "Opening",
    ///     "DESCRIPTION": "Introduce the problem",
    ///     "TIME_ALLOCATION": 10
    /// });
    /// let scene = SceneDescriptor::from_record(&record).unwrap();
    /// assert_eq!(scene.label(), "Opening");
    /// assert_eq!(scene.time_allocation(), "10");
    /// ```
    pub fn from_record(record: &Value) -> Option<Self> {
        let object = record.as_object()?;
        let mut label = None;
        let mut description = None;
        let mut time_allocation = None;
        for (key, value) in object {
            let key = key.to_ascii_lowercase();
            if key.starts_with("scene") || key == "label" || key == "title" {
                label = label.or_else(|| value_text(value));
            } else if key == "description" {
                description = value_text(value);
            } else if key.starts_with("time") {
                time_allocation = value_text(value);
            }
        }
        Some(Self {
            label: label.unwrap_or_default(),
            description: description.filter(|d| !d.trim().is_empty())?,
            time_allocation: time_allocation.unwrap_or_default(),
        })
    }

    /// The record shape the planning prompts expect for scene `index`.
    pub fn to_record(&self, index: usize) -> Value {
        let mut map = Map::new();
        map.insert(format!("SCENE{}", index + 1), Value::String(self.label.clone()));
        map.insert("DESCRIPTION".into(), Value::String(self.description.clone()));
        map.insert(
            "TIME_ALLOCATION".into(),
            Value::String(self.time_allocation.clone()),
        );
        Value::Object(map)
    }
}

/// Text content of a scalar or nested value.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
