//! Comment-aware scanner for the JSONC config format.
//!
//! Produces structural-parse-ready text plus a map of trailing comments,
//! keyed by the property whose declaration they follow. Comment syntax is
//! deliberately constrained: `//` line comments, `/* */` block comments,
//! and trailing commas. Nothing else.

use std::collections::HashMap;

/// Result of a comment-aware scan: comment-free text ready for the
/// structural parser, plus the trailing comments that were stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Comment-free text with trailing commas removed, trimmed.
    pub content: String,
    /// Property name -> the single-line comment trailing its declaration.
    pub comments: HashMap<String, String>,
}

/// Strip comments and trailing commas from `raw`.
///
/// The scan is string-aware: `//` inside a quoted value (for example a URL)
/// is data, not a comment. A `//` comment with non-blank text before it on
/// the same line is recorded against the nearest previously seen `"name":`
/// token. Block comments are discarded; an unterminated block comment
/// consumes to end of input. An unterminated string leaves the rest of the
/// input in-string, which makes the structural parse fail downstream.
pub fn parse_with_comments(raw: &str) -> ParsedDocument {
    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();

    let mut out = String::with_capacity(raw.len());
    let mut comments = HashMap::new();

    let mut in_string = false;
    let mut escaped = false;
    // Accumulates the current string literal so `"name":` can be recognized.
    let mut literal = String::new();
    // A string literal that just closed; becomes the current property name
    // if the next non-whitespace character is a colon.
    let mut closed_literal: Option<String> = None;
    let mut last_property: Option<String> = None;
    // Offset into `out` where the current output line begins.
    let mut line_start = 0;

    let mut i = 0;
    while i < len {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
                literal.push(c);
            } else if c == '\\' {
                escaped = true;
                literal.push(c);
            } else if c == '"' {
                in_string = false;
                closed_literal = Some(std::mem::take(&mut literal));
            } else {
                literal.push(c);
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                literal.clear();
                closed_literal = None;
                out.push(c);
                i += 1;
            }
            '/' if i + 1 < len && chars[i + 1] == '/' => {
                let mut j = i + 2;
                let mut text = String::new();
                while j < len && chars[j] != '\n' {
                    text.push(chars[j]);
                    j += 1;
                }
                // Only a trailing comment is attributed; a comment on a
                // line of its own belongs to nobody.
                if !out[line_start..].trim().is_empty() {
                    if let Some(name) = last_property.clone() {
                        comments.insert(name, text.trim().to_string());
                    }
                }
                i = j;
            }
            '/' if i + 1 < len && chars[i + 1] == '*' => {
                let mut j = i + 2;
                while j + 1 < len && !(chars[j] == '*' && chars[j + 1] == '/') {
                    j += 1;
                }
                i = if j + 1 < len { j + 2 } else { len };
            }
            '\n' => {
                out.push(c);
                line_start = out.len();
                i += 1;
            }
            ':' => {
                if let Some(name) = closed_literal.take() {
                    last_property = Some(name);
                }
                out.push(c);
                i += 1;
            }
            _ => {
                if !c.is_whitespace() {
                    closed_literal = None;
                }
                out.push(c);
                i += 1;
            }
        }
    }

    let content = strip_trailing_commas(&out).trim().to_string();
    ParsedDocument { content, comments }
}

/// Drop any `,` whose next non-whitespace character is `}` or `]`.
/// String-aware, so commas inside quoted values are untouched.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    let mut in_string = false;
    let mut escaped = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if !matches!(chars.get(j), Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Extract the text between the `/* CONFIG_SECTION */` and
/// `/* END_CONFIG_SECTION */` sentinels. A missing end sentinel takes
/// everything to end of input; a missing start sentinel yields `None`.
pub fn extract_config_section(raw: &str) -> Option<&str> {
    let (_, body_start) = find_sentinel(raw, "CONFIG_SECTION")?;
    let body = &raw[body_start..];
    match find_sentinel(body, "END_CONFIG_SECTION") {
        Some((end_start, _)) => Some(&body[..end_start]),
        None => Some(body),
    }
}

/// Locate `/* <word> */` allowing whitespace around the word.
/// Returns the byte range of the whole sentinel.
fn find_sentinel(text: &str, word: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(pos) = text[from..].find("/*") {
        let start = from + pos;
        let mut j = start + 2;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if text[j..].starts_with(word) {
            let mut k = j + word.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if text[k..].starts_with("*/") {
                return Some((start, k + 2));
            }
        }
        from = start + 2;
    }
    None
}
