//! Prompt catalogue for scene planning.
//!
//! Evaluator prompts ask for a literal YES/NO answer because the default
//! [`crate::RejectionTokenClassifier`] looks for the rejection token.

use reel_core::PlanField;

/// Persona attached to every planner and evaluator call.
pub const SYSTEM_MESSAGE: &str = "You are an expert at reading research papers and turning them into short narrated video summaries.";

/// First draft of the high-level scene breakdown.
pub const HIGH_PLANNING: &str = "Read the attached paper and design about ten concise scenes that together summarize its key contributions. \
Each scene must connect logically to the scene before and after it. Scenes must not repeat each other's content. \
Together they must tell the paper's findings as one coherent, technically accurate story. \
Give each scene between 5 and 10 seconds of video. Leave out acknowledgements and references.";

/// Forces a free-text breakdown into the scene record list.
pub const HIGH_PLAN_FORMAT: &str = "The TEXT below describes several video scenes. Copy it into a JSON list in exactly this shape, \
replacing every \"***\" with content from the TEXT, and output the list only: \
[{\"SCENE1\": \"***\", \"DESCRIPTION\": \"***\", \"TIME_ALLOCATION\": \"***\"}, {\"SCENE2\": \"***\", \"DESCRIPTION\": \"***\", \"TIME_ALLOCATION\": \"***\"}, ...] \
TEXT:";

/// Judges a formatted high-level plan.
pub const HIGH_EVALUATE: &str = "Below are the video scenes designed for the attached paper. Answer these questions: \
Do the scenes cover every key point the paper wants to convey? Are the scenes free of overlap and redundancy? \
Do they form a coherent and correct story? Answer \"YES\" or \"NO\". If you answer \"NO\", explain what should change. \
Current plan:";

/// Asks for a repaired high-level plan.
pub const HIGH_REPLAN: &str = "Those are the scenes you designed earlier. Revise them according to the feedback below and keep the format exactly as it was:";

/// Introduces worked examples appended to a first draft request.
pub const EXAMPLES_PREAMBLE: &str = "Here are some examples, not the scene I am asking you about:";

/// First draft of a single scene's plan.
pub const LOW_PLANNING: &str = "Choose a presentation style for the scene given at the end. Pick exactly one of: Slides, Professional, Talking Heads, Captioning, General Video. \
Weigh the dynamics, theme and content of the paper, and decide by walking these questions in order. \
(1) Can one or two figures or tables from the paper carry the scene? Then the style is Slides: give the exact position of that figure or table (for example Fig.1 or Table 2), never its text, plus a prompt and narration describing it. \
(2) Does the scene present molecular structures or mathematical principles? Then the style is Professional: say whether it is molecular or mathematical, give the formula or molecule, plus a prompt and narration. \
(3) Would a presenter speaking to camera suit the scene? Then the style is Talking Heads: describe the presenter and give what they say as narration. \
(4) Otherwise, if the scene has moving elements, the style is General Video: give a prompt a video generation model can follow. If it is static, the style is Captioning: give a description an image model can follow. \
In every case write narration a person can speak within the scene's TIME_ALLOCATION, which is fixed and must not change. \
Here is the scene:";

/// Forces a free-text scene plan into the plan object.
pub const LOW_PLAN_FORMAT: &str = "Fill the dictionary below from the text above. The \"style\" value must be one of Slides, Professional, Talking Heads, Captioning, General Video, or \"PASS\" when none fits. \
Output only the dictionary: {\"audio_content\": \"***\", \"style\": \"***\", \"source\": \"***\", \"prompt\": \"***\"}. \
Example: {\"audio_content\": \"This figure from the paper shows the whole pipeline.\", \"style\": \"Slides\", \"source\": \"Fig.1\", \"prompt\": \"Overview of the pipeline from input document to final video.\"}. \
Every value must be a string without double quotes inside it.";

/// Preamble of every per-field gate question.
pub const LOW_EVALUATE: &str = "This is the plan for one scene of a video summarizing part of the attached paper. \
Answer the question below with \"YES\" or \"NO\" to say whether the plan meets the requirement. If \"NO\", give the correct answer.";

/// Asks for a repaired scene plan.
pub const LOW_REPLAN: &str = "That is the scene plan you designed earlier, but the issues below came up. Fix them and keep exactly the same format as before:";

const STYLE_QUESTION: &str = "Is the style exactly one of Slides, Professional, Talking Heads, Captioning, General Video? Is it a reasonable choice for this scene?";

const AUDIO_QUESTION: &str = "Can the \"audio_content\" be spoken within the fixed time_cost without running long? Is the narration reasonable?";

const SOURCE_QUESTION: &str = "Only if the style is Slides: does \"source\" name a specific element of the paper (an exact table, figure or equation)? \
Only if the style is Professional: does the plan give a clear mathematical expression or molecular formula, so the content is clear without reading the paper? \
For any other style answer YES.";

const PROMPT_QUESTION: &str = "\"prompt\" should describe what the scene shows. Does it work as a prompt for a generation model (General Video, Captioning) or as an on-screen note (Slides, Professional)?";

/// Gate question asked for `field`.
pub fn field_question(field: PlanField) -> &'static str {
    match field {
        PlanField::Style => STYLE_QUESTION,
        PlanField::AudioContent => AUDIO_QUESTION,
        PlanField::Source => SOURCE_QUESTION,
        PlanField::Prompt => PROMPT_QUESTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_field_has_a_distinct_question() {
        let questions: std::collections::HashSet<_> = PlanField::iter().map(field_question).collect();
        assert_eq!(questions.len(), 4);
    }
}
