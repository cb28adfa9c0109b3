//! Recovering structured values from noisy model output.
//!
//! Model responses wrap JSON in markdown fences, surround it with prose, or
//! corrupt it slightly (single quotes, trailing commas, unescaped interior
//! quotes). [`extract_structured`] tries a fixed sequence of strategies and
//! stops at the first that decodes; when none does it fails with the
//! offending text rather than guessing.

use regex::Regex;
use reel_error::ParseError;
use serde_json::Value;
use std::sync::OnceLock;

/// Extract a JSON object or list from a model response.
///
/// Strategies, in order:
/// 1. Body of the first fenced code block (language tag skipped)
/// 2. The full text as-is
/// 3. The first balanced `{...}` or `[...]` span, whichever opens first
/// 4. Lenient repair of each candidate above
///
/// # Errors
///
/// Returns [`ParseError`] carrying the full text when no strategy decodes.
///
/// # Examples
///
/// ```
/// use reel_core::extract_structured;
///
/// let response = "Sure! Here is the plan:\n```json\n{\"style\": \"Slides\"}\n```\nGood luck.";
/// let value = extract_structured(response).unwrap();
/// assert_eq!(value["style"], "Slides");
///
/// assert!(extract_structured("I cannot do that.").is_err());
/// ```
pub fn extract_structured(raw: &str) -> Result<Value, ParseError> {
    let fenced = extract_from_code_block(raw);
    if let Some(value) = fenced.as_deref().and_then(decode) {
        return Ok(value);
    }

    if let Some(value) = decode(raw.trim()) {
        return Ok(value);
    }

    let spans = balanced_spans(raw);
    for span in &spans {
        if let Some(value) = decode(span) {
            return Ok(value);
        }
    }

    let mut candidates: Vec<&str> = Vec::new();
    if let Some(body) = fenced.as_deref() {
        candidates.push(body);
        candidates.extend(balanced_spans(body));
    }
    candidates.extend(spans.iter().copied());
    for candidate in candidates {
        if let Some(value) = repair(candidate) {
            tracing::debug!(preview = %preview(candidate), "Recovered JSON after lenient repair");
            return Ok(value);
        }
    }

    tracing::warn!(
        response_length = raw.len(),
        preview = %preview(raw),
        "No structured value found in model response"
    );
    Err(ParseError::new("no JSON object or list could be recovered", raw))
}

/// Extract a single field of a plan object by pattern.
///
/// Matches `"field": "<string>"`, `"field": {...}` or `"field": [...]`.
/// String values are unescaped; object and list values are returned as
/// their source text.
///
/// # Examples
///
/// ```
/// use reel_core::extract_field;
///
/// let text = r#"{"style": "Slides", "source": {"type": "TABLE", "number": 1}}"#;
/// assert_eq!(extract_field(text, "style").as_deref(), Some("Slides"));
/// assert_eq!(extract_field(text, "source").as_deref(), Some(r#"{"type": "TABLE", "number": 1}"#));
/// assert_eq!(extract_field(text, "prompt"), None);
/// ```
pub fn extract_field(text: &str, field: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"#, regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    let key = re.find(text)?;
    let rest = &text[key.end()..];
    match rest.chars().next()? {
        '"' => {
            let end = string_end(rest)?;
            let quoted = &rest[..end];
            Some(
                serde_json::from_str::<String>(quoted)
                    .unwrap_or_else(|_| quoted[1..quoted.len() - 1].to_string()),
            )
        }
        '{' => extract_balanced(rest, '{', '}').map(str::to_string),
        '[' => extract_balanced(rest, '[', ']').map(str::to_string),
        _ => None,
    }
}

/// Byte length of the double-quoted string opening `src`, quotes included.
fn string_end(src: &str) -> Option<usize> {
    let mut escape_next = false;
    for (i, ch) in src.char_indices().skip(1) {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)def animate\(self\):.*self\.wait\(\s*\d+(?:\.\d+)?\s*\)")
            .expect("valid animate regex")
    })
}

/// Extract animation code from a response.
///
/// Keeps the span from the first `def animate(self):` to the last
/// `self.wait(N)`, dropping fences and prose around it.
///
/// # Examples
///
/// ```
/// use reel_core::extract_code;
///
/// let reply = "```python\ndef animate(self):\n    self.play(Write(t))\n    self.wait(2)\n```";
/// let code = extract_code(reply).unwrap();
/// assert!(code.starts_with("def animate(self):"));
/// assert!(code.ends_with("self.wait(2)"));
/// ```
pub fn extract_code(text: &str) -> Option<String> {
    code_pattern().find(text).map(|m| m.as_str().to_string())
}

fn decode(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

/// Body of the first fenced code block, skipping a language tag.
///
/// A missing closing fence (truncated response) yields the rest of the text.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let content_start = start + 3;
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);
    let body = match response[skip_to..].find("```") {
        Some(end) => &response[skip_to..skip_to + end],
        None => &response[skip_to..],
    };
    Some(body.trim().to_string())
}

/// Balanced `{...}` and `[...]` spans, the one opening first listed first.
fn balanced_spans(response: &str) -> Vec<&str> {
    let brace = response.find('{');
    let bracket = response.find('[');
    let order = match (brace, bracket) {
        (Some(c), Some(b)) if b < c => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };
    order
        .iter()
        .filter_map(|(open, close)| extract_balanced(response, *open, *close))
        .collect()
}

/// Content between the first `open` and its matching `close`, string- and
/// escape-aware.
fn extract_balanced(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

fn trailing_comma() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"))
}

/// Lenient decode: comments and trailing commas dropped, single-quoted
/// strings converted, then naive interior quotes escaped.
fn repair(candidate: &str) -> Option<Value> {
    let cleaned = strip_comments(candidate);
    let cleaned = trailing_comma().replace_all(&cleaned, "$1").into_owned();
    let requoted = convert_single_quotes(&cleaned);
    if let Some(value) = decode(&requoted) {
        return Some(value);
    }
    decode(&escape_interior_quotes(&requoted))
}

/// Removes `//` and `/* */` comments outside of strings.
///
/// Single-quoted strings are recognised with the same open and close rules
/// as [`convert_single_quotes`], so a URL inside one survives.
fn strip_comments(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut quote: Option<char> = None;
    let mut last_structural = None;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 1;
            } else if ch == q && (q == '"' || closes_single(&chars[i + 1..])) {
                quote = None;
                last_structural = Some(ch);
            }
        } else if ch == '"'
            || (ch == '\'' && matches!(last_structural, None | Some('{' | '[' | ',' | ':')))
        {
            quote = Some(ch);
            out.push(ch);
        } else if ch == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        } else if ch == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            i += 2;
            continue;
        } else {
            if !ch.is_whitespace() {
                last_structural = Some(ch);
            }
            out.push(ch);
        }
        i += 1;
    }
    out
}

/// Whether a `'` followed by `rest` ends a single-quoted string.
fn closes_single(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !c.is_whitespace())
        .is_none_or(|c| matches!(c, ',' | '}' | ']' | ':'))
}

/// Converts single-quoted JSON strings to double-quoted ones.
///
/// A `'` opens a string only where a value or key may start (after `{`,
/// `[`, `,` or `:`) and closes it only before `,`, `}`, `]` or `:`, so
/// apostrophes inside words survive.
fn convert_single_quotes(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut last_structural = None;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if in_double {
            out.push(ch);
            if ch == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 1;
            } else if ch == '"' {
                in_double = false;
            }
        } else if in_single {
            if ch == '\'' && closes_single(&chars[i + 1..]) {
                out.push('"');
                in_single = false;
            } else if ch == '"' {
                out.push_str("\\\"");
            } else {
                out.push(ch);
            }
        } else {
            match ch {
                '"' => {
                    in_double = true;
                    out.push(ch);
                }
                '\'' if matches!(last_structural, None | Some('{' | '[' | ',' | ':')) => {
                    in_single = true;
                    out.push('"');
                }
                _ => {
                    if !ch.is_whitespace() {
                        last_structural = Some(ch);
                    }
                    out.push(ch);
                }
            }
        }
        i += 1;
    }
    out
}

/// Escapes a `"` sitting between two word characters, as in `a "quoted"word`.
fn escape_interior_quotes(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    for (i, ch) in chars.iter().enumerate() {
        let between_words = *ch == '"'
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
        if between_words {
            out.push_str("\\\"");
        } else {
            out.push(*ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_block_with_surrounding_noise() {
        let response = r#"
Here is the breakdown you asked for:

```json
[{"SCENE1": "Intro", "DESCRIPTION": "Hook", "TIME_ALLOCATION": "8"}]
```

Let me know if you want changes.
"#;
        let value = extract_structured(response).unwrap();
        assert_eq!(
            value,
            json!([{"SCENE1": "Intro", "DESCRIPTION": "Hook", "TIME_ALLOCATION": "8"}])
        );
    }

    #[test]
    fn raw_json_is_returned_unchanged() {
        let value = extract_structured(r#"{"a": [1, 2, {"b": "c"}]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2, {"b": "c"}]}));
    }

    #[test]
    fn balanced_span_inside_prose() {
        let value =
            extract_structured(r#"The plan is {"style": "General", "note": "use {braces}"} ok?"#)
                .unwrap();
        assert_eq!(value["note"], "use {braces}");
    }

    #[test]
    fn list_preferred_when_it_opens_first() {
        let value = extract_structured(r#"Scenes: [{"x": 1}, {"x": 2}] done"#).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn truncated_fence_still_decodes() {
        let value = extract_structured("```json\n{\"style\": \"Slides\"}").unwrap();
        assert_eq!(value["style"], "Slides");
    }

    #[test]
    fn repairs_single_quotes_and_trailing_commas() {
        let value = extract_structured("{'style': 'Captioning', 'prompt': 'a cat's hat',}").unwrap();
        assert_eq!(value["style"], "Captioning");
        assert_eq!(value["prompt"], "a cat's hat");
    }

    #[test]
    fn repairs_unescaped_interior_quotes() {
        let value = extract_structured(r#"{"audio_content": "the so"called"method"}"#).unwrap();
        assert_eq!(value["audio_content"], r#"the so"called"method"#);
    }

    #[test]
    fn strips_comments_outside_strings() {
        let value =
            extract_structured("{\n  // chosen style\n  \"style\": \"http://x\"\n}").unwrap();
        assert_eq!(value["style"], "http://x");
    }

    #[test]
    fn unrecoverable_text_fails_with_the_text() {
        let err = extract_structured("no structure {here").unwrap_err();
        assert_eq!(err.text, "no structure {here");
        assert_eq!(
            extract_structured("no structure {here").unwrap_err().message,
            err.message
        );
    }

    #[test]
    fn scalar_json_is_not_a_structure() {
        assert!(extract_structured("42").is_err());
        assert!(extract_structured("\"YES\"").is_err());
    }

    #[test]
    fn extraction_is_idempotent() {
        let value = extract_structured("```\n{'k': [1,2,],}\n```").unwrap();
        let again = extract_structured(&value.to_string()).unwrap();
        assert_eq!(value, again);
    }

    #[test]
    fn single_quoted_url_survives_comment_stripping() {
        let value =
            extract_structured("{'style': 'Slides', 'source': 'https://arxiv.org/abs/1706.03762'}")
                .unwrap();
        assert_eq!(value["style"], "Slides");
        assert_eq!(value["source"], "https://arxiv.org/abs/1706.03762");
    }

    #[test]
    fn nested_field_value_is_kept_whole() {
        let text = r#"{"source": {"a": {"b": 1}, "c": 2}, "tags": [[1, 2], ["]"]]}"#;
        assert_eq!(
            extract_field(text, "source").as_deref(),
            Some(r#"{"a": {"b": 1}, "c": 2}"#)
        );
        assert_eq!(extract_field(text, "tags").as_deref(), Some(r#"[[1, 2], ["]"]]"#));
    }

    #[test]
    fn field_with_escaped_quotes() {
        let text = r#"{"audio_content": "He said \"hi\"", "style": "General"}"#;
        assert_eq!(extract_field(text, "audio_content").as_deref(), Some(r#"He said "hi""#));
    }

    #[test]
    fn code_spans_first_def_to_last_wait() {
        let text = "Fixed:\ndef animate(self):\n    self.wait(1)\n    x = 2\n    self.wait(3)\nThanks";
        assert_eq!(
            extract_code(text).as_deref(),
            Some("def animate(self):\n    self.wait(1)\n    x = 2\n    self.wait(3)")
        );
        assert_eq!(extract_code("print('hi')"), None);
    }
}
