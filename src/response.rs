//! Tolerant reading of chat-completion responses
//!
//! Only `choices[0].message.content` matters, and endpoints disagree on its
//! shape (plain string or an array of typed parts), so the answer is located
//! by scanning for keys instead of deserializing the whole document.

use once_cell::sync::Lazy;
use regex::Regex;

/// Returned whenever the response has no readable answer
pub const PARSE_FAILURE: &str = "Error: Could not parse AI response";

static COLON_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r": (https?://)").expect("Invalid colon URL regex")
});

static COLON_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r": \[").expect("Invalid colon link regex")
});

static SPACED_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r" (https?://)").expect("Invalid spaced URL regex")
});

/// Extract the assistant's answer from a raw response body.
///
/// Never panics; malformed input yields [`PARSE_FAILURE`].
pub fn parse_chat_response(raw: &str) -> String {
    match find_answer(raw) {
        Some(answer) => answer,
        None => {
            tracing::warn!(bytes = raw.len(), "could not locate answer in chat response");
            PARSE_FAILURE.to_string()
        }
    }
}

/// Whether `text` is the parse-failure sentinel
pub fn is_parse_failure(text: &str) -> bool {
    text == PARSE_FAILURE
}

fn find_answer(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();

    let message = raw.find("\"message\"")?;
    let content = message + raw[message..].find("\"content\"")?;
    let value = skip_to_value(bytes, content + "\"content\"".len())?;

    let quote = if bytes[value] == b'[' {
        let text_key = value + raw[value..].find("\"text\"")?;
        let text_value = skip_to_value(bytes, text_key + "\"text\"".len())?;
        (bytes[text_value] == b'"').then_some(text_value)?
    } else if bytes[value] == b'"' {
        value
    } else {
        return None;
    };

    let end = find_string_end(bytes, quote + 1)?;
    Some(unescape_json_string(&raw[quote + 1..end]))
}

/// Index of the first non-whitespace byte after the `:` that follows `from`
fn skip_to_value(bytes: &[u8], from: usize) -> Option<usize> {
    let colon = from + bytes.get(from..)?.iter().position(|&b| b == b':')?;
    let offset = bytes.get(colon + 1..)?.iter().position(|b| !b.is_ascii_whitespace())?;
    Some(colon + 1 + offset)
}

/// Index of the closing quote of a string whose body starts at `start`
fn find_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            return Some(i);
        }
    }
    None
}

/// Undo JSON string escapes. Unknown escapes are kept verbatim, backslash included.
pub fn unescape_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Put URLs and markdown links that trail a colon or a space on their own lines
pub fn format_for_readability(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    let text = COLON_URL_RE.replace_all(text, ":\n\n$1");
    let text = COLON_LINK_RE.replace_all(&text, ":\n\n[");
    SPACED_URL_RE.replace_all(&text, "\n$1").into_owned()
}
