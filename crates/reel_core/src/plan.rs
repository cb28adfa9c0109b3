//! Low-level scene plans.

use crate::scene::value_text;
use crate::{SceneDescriptor, Style};
use reel_error::GenerationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plan fields that pass through an acceptance gate, in gate order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumCount,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanField {
    /// Rendering style
    Style,
    /// Narration text
    AudioContent,
    /// Source locator: figure, table or formula
    Source,
    /// Generation or annotation prompt
    Prompt,
}

impl PlanField {
    /// Gate position of this field.
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Field at gate position `index`.
    pub fn at(index: usize) -> Option<PlanField> {
        match index {
            0 => Some(PlanField::Style),
            1 => Some(PlanField::AudioContent),
            2 => Some(PlanField::Source),
            3 => Some(PlanField::Prompt),
            _ => None,
        }
    }
}

/// Fully specified plan for one scene.
///
/// `scenario` and `time_cost` come from the scene descriptor; the remaining
/// fields are filled in by low-level planning. The `style` field keeps the
/// planner's raw text; [`ScenePlan::parsed_style`] maps it onto [`Style`].
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", into)]
#[serde(default)]
pub struct ScenePlan {
    /// Scene description
    scenario: String,
    /// Time budget text
    time_cost: String,
    /// Narration
    audio_content: String,
    /// Raw style text
    style: String,
    /// Source locator
    source: String,
    /// Generation prompt
    prompt: String,
}

impl ScenePlan {
    /// Starts a plan for a scene, before any field is drafted.
    pub fn for_scene(scene: &SceneDescriptor) -> Self {
        Self {
            scenario: scene.description().clone(),
            time_cost: scene.time_allocation().clone(),
            ..Self::default()
        }
    }

    /// Current value of a gated field.
    pub fn field(&self, field: PlanField) -> &str {
        match field {
            PlanField::Style => &self.style,
            PlanField::AudioContent => &self.audio_content,
            PlanField::Source => &self.source,
            PlanField::Prompt => &self.prompt,
        }
    }

    /// Overwrites a gated field.
    pub fn set_field(&mut self, field: PlanField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PlanField::Style => self.style = value,
            PlanField::AudioContent => self.audio_content = value,
            PlanField::Source => self.source = value,
            PlanField::Prompt => self.prompt = value,
        }
    }

    /// Merges a drafted plan object into this plan.
    ///
    /// Gated fields present and non-null in the draft overwrite; absent ones
    /// keep their value. `scenario` and `time_cost` are never touched.
    /// Returns how many fields were overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use reel_core::ScenePlan;
    /// use serde_json::json;
    ///
    /// let mut plan = ScenePlan::default().with_style("Slides");
    /// let changed = plan.merge_draft(&json!({"audio_content": "Hello", "scenario": "ignored"}));
    /// assert_eq!(changed, 1);
    /// assert_eq!(plan.style(), "Slides");
    /// assert_eq!(plan.audio_content(), "Hello");
    /// assert_eq!(plan.scenario(), "");
    /// ```
    pub fn merge_draft(&mut self, draft: &Value) -> usize {
        let Some(object) = draft.as_object() else {
            return 0;
        };
        let mut changed = 0;
        for (key, value) in object {
            let Some(field) = field_for_key(key) else {
                continue;
            };
            if let Some(text) = value_text(value) {
                self.set_field(field, text);
                changed += 1;
            }
        }
        changed
    }

    /// Parses the style field into the closed [`Style`] type.
    pub fn parsed_style(&self) -> Result<Style, GenerationError> {
        self.style.parse()
    }

    /// Time budget in seconds; see [`crate::parse_time_budget`].
    pub fn time_budget(&self) -> f64 {
        crate::parse_time_budget(&self.time_cost)
    }
}

fn field_for_key(key: &str) -> Option<PlanField> {
    match key.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "style" => Some(PlanField::Style),
        "audio_content" | "audio" | "narration" => Some(PlanField::AudioContent),
        "source" => Some(PlanField::Source),
        "prompt" => Some(PlanField::Prompt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn gate_positions_follow_declaration_order() {
        let fields: Vec<_> = PlanField::iter().collect();
        assert_eq!(fields.len(), PlanField::COUNT);
        for (i, field) in fields.iter().enumerate() {
            assert_eq!(field.position(), i);
            assert_eq!(PlanField::at(i), Some(*field));
        }
        assert_eq!(PlanField::at(4), None);
        assert_eq!(PlanField::AudioContent.to_string(), "audio_content");
    }

    #[test]
    fn merge_serializes_structured_sources() {
        let mut plan = ScenePlan::default();
        plan.merge_draft(&json!({"source": {"type": "TABLE", "number": 2}, "prompt": null}));
        let source: Value = serde_json::from_str(plan.source()).unwrap();
        assert_eq!(source["number"], 2);
        assert_eq!(plan.prompt(), "");
    }

    #[test]
    fn plan_keeps_descriptor_fields() {
        let scene = SceneDescriptor::new("Intro", "Explain attention", "10 seconds");
        let mut plan = ScenePlan::for_scene(&scene);
        plan.merge_draft(&json!({"time_cost": "99", "style": "General"}));
        assert_eq!(plan.time_cost(), "10 seconds");
        assert_eq!(plan.time_budget(), 10.0);
        assert_eq!(plan.parsed_style().unwrap(), Style::General);
    }
}
