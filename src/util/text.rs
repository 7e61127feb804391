use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended by [`truncate_to_width`].
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Escapes the characters that are significant in HTML text content.
///
/// Returns `Cow::Borrowed` when nothing needs escaping, which is the common
/// case for verse text.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Wraps plain text in a single `<p>` element.
pub fn paragraph_html(plain: &str) -> String {
    format!("<p>{}</p>", escape_html(plain))
}

/// Strips terminal control characters and ANSI escape sequences.
///
/// Poem text arrives from a remote API and is printed straight to the
/// terminal by the CLI. Tab, newline and carriage return are kept.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c == '\u{1b}' || c == '\u{7f}' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'));

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // CSI: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&next) {
                        break;
                    }
                }
            }
            continue;
        }
        if !is_control(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Truncates a string to `max_width` terminal columns, appending "..." when
/// anything was cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(take_columns(s, max_width).to_string());
    }

    let kept = take_columns(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{kept}{ELLIPSIS}"))
}

/// Longest prefix of `s` that fits in `columns`.
fn take_columns(s: &str, columns: usize) -> &str {
    let mut width = 0;
    for (idx, c) in s.char_indices() {
        width += UnicodeWidthChar::width(c).unwrap_or(0);
        if width > columns {
            return &s[..idx];
        }
    }
    s
}
