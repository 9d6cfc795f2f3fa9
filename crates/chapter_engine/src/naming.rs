//! Deterministic page filenames and filesystem-safe path components.

/// Normalize a raw chapter label to digits and hyphens: `.` becomes `-`,
/// everything else non-numeric is dropped. `"Chapter 12.5"` -> `"12-5"`.
pub fn normalize_chapter_tag(raw: &str) -> String {
    raw.trim()
        .replace('.', "-")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Filename for one accepted page: `{tag}-{sequence}.png`.
///
/// A purely numeric tag is zero-padded to 4 digits; a tag that does not
/// parse as an integer (e.g. `"12-5"`) is used as-is. The sequence is
/// 1-based acceptance order, padded to 3 digits, so lexicographic order
/// over the filenames of a run equals numeric page order.
pub fn page_filename(chapter_tag: &str, sequence: usize) -> String {
    match chapter_tag.parse::<i64>() {
        Ok(number) => format!("{number:04}-{sequence:03}.png"),
        Err(_) => format!("{chapter_tag}-{sequence:03}.png"),
    }
}

/// Windows-safe directory component derived from the work's display title.
pub fn sanitize_title(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 80 {
        final_name.truncate(80);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
