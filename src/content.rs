//! Content helpers
//!
//! Small text transforms applied to generated posts before they are saved
//! or shown.

/// Strip a wrapping markdown code fence
///
/// Generators sometimes return the whole post inside ```` ```markdown ````.
/// When the first non-blank line opens a fence, that line is dropped, along
/// with a closing ```` ``` ```` on the last line. Anything else is returned
/// unchanged apart from surrounding whitespace.
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();

    match lines.first() {
        Some(first) if first.trim().starts_with("```") => {
            lines.remove(0);
        }
        _ => return trimmed.to_string(),
    }

    if lines.last().map(|l| l.trim() == "```").unwrap_or(false) {
        lines.pop();
    }

    lines.join("\n").trim_start_matches('\n').to_string()
}

/// First `max_chars` characters, with `...` appended when truncated
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
