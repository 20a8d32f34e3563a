//! Filename sanitization.
//!
//! Attachment names end up on whatever filesystem the client runs, so this
//! is stricter than Linux alone: Windows-reserved punctuation is replaced
//! too.

/// Characters replaced with `_` beyond control characters and separators.
const RESERVED: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Sanitizes a candidate filename component.
///
/// - Replaces NUL, `/`, `\`, control characters, whitespace, double quotes
///   and Windows-reserved punctuation with `_`
/// - Collapses runs of `_`
/// - Trims leading/trailing dots, spaces and underscores
/// - Caps the result at 200 bytes, leaving headroom for the uuid suffix and
///   extension under the 255-byte NAME_MAX limit
pub fn sanitize_filename(name: &str) -> String {
    const MAX_LEN: usize = 200;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let keep = !(c == '\0'
            || c == '/'
            || c == '\\'
            || c.is_control()
            || c.is_whitespace()
            || RESERVED.contains(&c));

        if keep {
            out.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == ' ' || c == '_');

    if trimmed.len() > MAX_LEN {
        let mut take = MAX_LEN;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_filename("a/b\\c.mp4"), "a_b_c.mp4");
    }

    #[test]
    fn replaces_windows_reserved() {
        assert_eq!(sanitize_filename("what? a: title*"), "what_a_title");
    }

    #[test]
    fn trims_dots_spaces_underscores() {
        assert_eq!(sanitize_filename("  ..clip.mp4..  "), "clip.mp4");
    }

    #[test]
    fn collapses_underscore_runs() {
        assert_eq!(sanitize_filename("a   b\t\tc"), "a_b_c");
    }

    #[test]
    fn dotdot_collapses_to_empty() {
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("."), "");
    }

    #[test]
    fn caps_length_at_char_boundary() {
        let long = "é".repeat(300);
        let s = sanitize_filename(&long);
        assert!(s.len() <= 200);
        assert!(s.is_char_boundary(s.len()));
    }
}
