//! Line-level cleanup shared by every input reader.
//!
//! All input files use `#` comments and may contain blank lines; CSV files
//! additionally tolerate stray spaces and tabs between fields.

/// Drop everything from the first `#` on.
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Strip the comment and remove all whitespace. Returns `None` when nothing
/// is left, so callers can skip blank and comment-only lines uniformly.
pub fn clean_csv_line(line: &str) -> Option<String> {
    let cleaned: String = strip_comment(line)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Strip the comment and trim; `None` when the line carries no data.
/// Used for whitespace-separated formats (SWC).
pub fn clean_ws_line(line: &str) -> Option<&str> {
    let cleaned = strip_comment(line).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
