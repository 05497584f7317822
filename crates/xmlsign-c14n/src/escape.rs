#![forbid(unsafe_code)]

//! Character escaping for canonical output.
//!
//! - Text nodes: `&` `<` `>` and CR are replaced.
//! - Attribute values: `&` `<` `"` and TAB, LF, CR are replaced.
//! - PI data: CR is replaced.

use std::borrow::Cow;

fn escape_with(s: &str, replacement: fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !s.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match replacement(ch) {
            Some(rep) => out.push_str(rep),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn text_replacement(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

fn attr_replacement(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

fn pi_replacement(ch: char) -> Option<&'static str> {
    (ch == '\r').then_some("&#xD;")
}

/// Escape text node content.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, text_replacement)
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, attr_replacement)
}

/// Escape processing instruction data.
pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape_with(s, pi_replacement)
}
