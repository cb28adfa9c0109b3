//! Structural contract for generated animation code.

/// Longest animation method accepted, in lines.
pub const MAX_CODE_LINES: usize = 100;

const FIRST_LINE: &str = "def animate(self):";

/// Check `code` against the animation contract.
///
/// The code must start with `def animate(self):`, end with
/// `self.wait(N)`, import nothing, and span at most [`MAX_CODE_LINES`]
/// lines. Blank lines at either end are ignored. `Err` lists every rule
/// that was broken.
///
/// # Examples
///
/// ```
/// use reel_generation::check_code;
///
/// assert!(check_code("def animate(self):\n    self.play(Create(Circle()))\n    self.wait(2)").is_ok());
/// assert!(check_code("def animate(self):\n    self.play(Create(Circle()))").is_err());
/// ```
pub fn check_code(code: &str) -> Result<(), String> {
    let lines: Vec<&str> = code
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |i| i + 1);
    let lines = &lines[..end];

    let mut problems = Vec::new();
    match lines.first() {
        Some(first) if first.trim_end() == FIRST_LINE => {}
        _ => problems.push(format!("first line must be '{}'", FIRST_LINE)),
    }
    match lines.last() {
        Some(last) if is_wait(last.trim()) => {}
        _ => problems.push("last line must be 'self.wait(N)'".to_string()),
    }
    if lines.iter().any(|line| is_import(line.trim_start())) {
        problems.push("code must not import anything".to_string());
    }
    if lines.len() > MAX_CODE_LINES {
        problems.push(format!(
            "code has {} lines, at most {} allowed",
            lines.len(),
            MAX_CODE_LINES
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

fn is_wait(line: &str) -> bool {
    line.strip_prefix("self.wait(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(|arg| arg.trim().parse::<f64>().is_ok())
        .unwrap_or(false)
}

fn is_import(line: &str) -> bool {
    line.starts_with("import ") || (line.starts_with("from ") && line.contains(" import "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_padded_valid_code() {
        let code = "\n\ndef animate(self):\n    dot = Dot()\n    self.play(FadeIn(dot))\n    self.wait(1.5)\n\n";
        assert_eq!(check_code(code), Ok(()));
    }

    #[test]
    fn reports_every_broken_rule() {
        let code = "import numpy as np\ndef animate(self):\n    self.play(Write(Text('x')))";
        let err = check_code(code).unwrap_err();
        assert!(err.contains("first line"));
        assert!(err.contains("last line"));
        assert!(err.contains("import"));
    }

    #[test]
    fn rejects_long_code() {
        let body: String = (0..MAX_CODE_LINES).map(|_| "    self.play(Wait())\n").collect();
        let code = format!("def animate(self):\n{}    self.wait(1)", body);
        assert!(check_code(&code).unwrap_err().contains("lines"));
    }

    #[test]
    fn wait_needs_a_number() {
        assert!(check_code("def animate(self):\n    self.wait(n)").is_err());
        assert!(check_code("def animate(self):\n    self.wait( 3 )").is_ok());
    }
}
