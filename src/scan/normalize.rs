//! Line normalization: string stripping and comment detection.
//!
//! These are heuristics over a single line of text. They never fail;
//! malformed quoting degrades to "the rest of the line is a string".

/// Remove the contents of quoted regions, keeping the delimiters.
///
/// Handles double-quoted, single-quoted, and backtick strings with
/// backslash escapes. An unterminated string swallows the remainder of
/// the line.
///
/// ```
/// use guardrail::scan::strip_strings;
/// assert_eq!(strip_strings(r#"obj["x"] = "a {}""#), r#"obj[""] = """#);
/// ```
pub fn strip_strings(line: &str) -> String {
    kept_chars(line).map(|(_, ch)| ch).collect()
}

/// Map a byte offset in [`strip_strings`] output back to the raw line.
///
/// Offsets at or past the end of the stripped text map to `line.len()`.
///
/// ```
/// use guardrail::scan::raw_offset;
/// let line = r#"a = "xyz" ?? b"#;
/// // stripped: `a = "" ?? b`, where `?` sits at offset 7
/// assert_eq!(&line[raw_offset(line, 7)..], "?? b");
/// ```
pub fn raw_offset(line: &str, stripped_offset: usize) -> usize {
    let mut consumed = 0;
    for (idx, ch) in kept_chars(line) {
        if consumed >= stripped_offset {
            return idx;
        }
        consumed += ch.len_utf8();
    }
    line.len()
}

/// Characters that survive string stripping, with their raw byte index.
fn kept_chars(line: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut string_char: Option<char> = None;
    let mut escaped = false;

    line.char_indices().filter(move |&(_, ch)| match string_char {
        None => {
            if ch == '"' || ch == '\'' || ch == '`' {
                string_char = Some(ch);
            }
            true
        }
        Some(quote) => {
            if escaped {
                escaped = false;
                false
            } else if ch == '\\' {
                escaped = true;
                false
            } else if ch == quote {
                string_char = None;
                true
            } else {
                false
            }
        }
    })
}

/// Check whether a line is a comment (or part of a block comment).
///
/// Recognizes `//` line comments, `/*` openers, `*` continuation lines,
/// `*/` closers and `#!` shebangs. A bare `#` is not a comment since it
/// starts private class fields.
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("#!")
}

/// Count literal braces outside string literals.
///
/// Returns `(opens, closes)`.
pub fn count_braces(line: &str) -> (usize, usize) {
    strip_strings(line)
        .chars()
        .fold((0, 0), |(opens, closes), ch| match ch {
            '{' => (opens + 1, closes),
            '}' => (opens, closes + 1),
            _ => (opens, closes),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_double_quoted() {
        assert_eq!(strip_strings(r#"const s = "obj[x] = y";"#), r#"const s = "";"#);
    }

    #[test]
    fn test_strip_keeps_code_outside_strings() {
        assert_eq!(
            strip_strings(r#"obj["x"] = "contains = and {}""#),
            r#"obj[""] = """#
        );
    }

    #[test]
    fn test_strip_mixed_quotes() {
        // Apostrophe inside a double-quoted string is content, not a delimiter
        assert_eq!(strip_strings(r#"say("it's") + 'a"b'"#), r#"say("") + ''"#);
    }

    #[test]
    fn test_strip_backticks() {
        assert_eq!(strip_strings("const t = `${a} {b}`;"), "const t = ``;");
    }

    #[test]
    fn test_strip_escaped_quote() {
        assert_eq!(strip_strings(r#"x = "a \" { b" + y"#), r#"x = "" + y"#);
    }

    #[test]
    fn test_strip_unterminated_consumes_rest() {
        assert_eq!(strip_strings(r#"x = "never closed { ["#), r#"x = ""#);
    }

    #[test]
    fn test_strip_no_strings() {
        assert_eq!(strip_strings("let a = b[c];"), "let a = b[c];");
        assert_eq!(strip_strings(""), "");
    }

    #[test]
    fn test_raw_offset_skips_string_contents() {
        let line = "const name = user.name ?? 'anonymous';";
        let stripped = strip_strings(line);
        let start = stripped.find("''").unwrap();
        let end = stripped.find(';').unwrap();
        assert_eq!(&line[raw_offset(line, start)..raw_offset(line, end)], "'anonymous'");
        assert_eq!(raw_offset(line, stripped.len()), line.len());
        assert_eq!(raw_offset(line, 0), 0);
    }

    #[test]
    fn test_raw_offset_unterminated_string() {
        let line = r#"x = "open { ["#;
        assert_eq!(raw_offset(line, strip_strings(line).len()), line.len());
    }

    #[test]
    fn test_is_comment_line() {
        assert!(is_comment_line("// let x = 1"));
        assert!(is_comment_line("    /* block"));
        assert!(is_comment_line("   * continuation"));
        assert!(is_comment_line("   */"));
        assert!(is_comment_line("#!/usr/bin/env node"));
        assert!(!is_comment_line("let x = 1; // trailing"));
        assert!(!is_comment_line("#private = 1;"));
        assert!(!is_comment_line(""));
    }

    #[test]
    fn test_count_braces_ignores_strings() {
        assert_eq!(count_braces("if (a) { x = '{'; }"), (1, 1));
        assert_eq!(count_braces(r#"const s = "}}}";"#), (0, 0));
        assert_eq!(count_braces("items.map((x) => {"), (1, 0));
    }
}
