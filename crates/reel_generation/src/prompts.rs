//! Prompt catalogue for media generation and visual evaluation.

/// Visual check for generated video and images.
pub const GENERAL_VISUAL_EVAL: &str = "These frames come from the clip made to introduce the content above. Answer each question with \"YES\" or \"NO\", and give a reason for every \"NO\": \
Does it convey serious subject matter? Is the picture filled with vivid scenes rather than meaningless numbers, letters and symbols? \
Is it clearly relevant to this description:";

/// Visual check for rendered mathematical animations.
pub const PROFESSIONAL_VISUAL_EVAL: &str = "These frames come from the animation made to introduce the content above. Answer each question with \"YES\" or \"NO\", and give a reason for every \"NO\": \
Is there animated content in the bottom left corner? Is the animation reasonable and mathematically sound? \
Do the animation and the text avoid overlapping each other?";

/// Visual check for document figures placed on a slide.
pub const SLIDES_VISUAL_EVAL: &str = "This image was lifted from the paper for a presentation slide. Answer with \"YES\" or \"NO\": \
Does the text below work as a caption under this image on a slide? Does it explain the image? Text:";

/// Sorts a professional scene into a sub-route.
pub const PROFESSIONAL_CLASSIFY: &str = "Is this scene about mathematical content? If so, answer \"math\". \
Is it about visualizing a molecule? If so, answer \"mol\". Scene:";

/// Brings animation code into the required shape.
pub const CODE_FORMAT: &str = "The code below only needs to be an animation method, not a full program. Check that it meets every rule: \
it has no import statements; it is simple and at most 100 lines; its first line is 'def animate(self):'; \
its last line is 'self.wait(X)' where X is a number; its indentation is valid. \
If any rule is broken, rewrite it so all of them hold. Output the code only.";

/// Rewrites a scene prompt into an on-screen caption.
pub const CAPTION_REWRITE: &str = "Rewrite the text below as one whole, meaningful sentence that works as a caption in a video. \
Keep about five words per line and separate lines with \"\\n\". Return the caption only.";

/// First request for a diffusion video prompt.
pub fn video_prompt(prompt: &str) -> String {
    format!(
        "Use the following as material for a video scene a diffusion model can understand and generate. Return the prompt only.\n{}",
        prompt
    )
}

/// First request for a diffusion image prompt.
pub fn image_prompt(scenario: &str, prompt: &str) -> String {
    format!(
        "Use \"{}\" and \"{}\" as material for an image a diffusion model can understand and generate. Return the prompt only.",
        scenario, prompt
    )
}

/// Rewrite of a generation prompt after a rejected candidate.
pub fn refine_prompt(feedback: &str, prompt: &str) -> String {
    format!(
        "{}\n\nWrite a new generation prompt that fixes the issues above and stays close to: {}\nReturn the prompt only.",
        feedback, prompt
    )
}

/// Asks where a slide's source lives in the document.
pub fn locate_source(source: &str) -> String {
    format!(
        "Where is \"{}\" in the attached paper? Answer with a JSON object {{\"type\": \"TABLE\" or \"IMAGE\", \"number\": <its index as an integer>}}.",
        source
    )
}

/// Rewrite of a slide caption after a rejected slide.
pub fn refine_caption(feedback: &str, prompt: &str) -> String {
    format!(
        "The slide caption was rejected for this reason: {}\nOld caption: {}\nReturn a better caption only.",
        feedback, prompt
    )
}

/// First request for animation code.
pub fn animation_request(source: &str, prompt: &str, examples: &str) -> String {
    let mut request = format!(
        "Write a Python method named animate for a manim Scene that draws in the bottom left corner of the screen about {source}. \
The first line must be 'def animate(self):' and the last line must be 'self.wait(X)'. Do not import anything. \
Show intuitive visual content such as function graphs. Stay faithful to {source} and {prompt}. Output the method only."
    );
    if !examples.is_empty() {
        request.push_str(" Example:\n");
        request.push_str(examples);
    }
    request
}

/// Code repair after a render failure.
pub fn repair_code(code: &str, prompt: &str, error: &str) -> String {
    format!(
        "{code}\nCheck the code above against its rules and fix it: the first line is 'def animate(self):' and the last line is 'self.wait(X)' with X a positive number. \
Keep it simple, mathematical and on the theme {prompt}. Output the corrected code only. Render error:\n{error}"
    )
}

/// Picks the molecule a scene is about.
pub fn molecule_name(source: &str, prompt: &str) -> String {
    format!(
        "Name the protein or molecule most related to \"{}\" and \"{}\". Return the name only.",
        source, prompt
    )
}

/// Rewrites narration to introduce a molecule.
pub fn molecule_narration(narration: &str, name: &str) -> String {
    format!(
        "Rewrite this narration as a molecular biology introduction that mentions {}, in at most 50 words. Return the narration only.\n{}",
        name, narration
    )
}
