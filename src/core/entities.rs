//! Entity decoding and output escaping
//!
//! Decoding (`clean`) accepts the five predefined entities plus decimal and
//! hexadecimal character references. Anything else is rejected.
//!
//! Escaping follows a fixed safety policy: printable ASCII and the ranges
//! 0xA1-0xD7FF and 0xE000-0xFFFD pass through, the five specials use their
//! named entity, and every other code point becomes `&#x..;`.
//!
//! Uses Cow for zero-copy when nothing needs rewriting.

use super::chars::{entity_for, named_entity};
use memchr::memchr;
use std::borrow::Cow;

/// Why an entity reference could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityError {
    /// Byte offset of the offending `&` within the cleaned input
    pub offset: usize,
    pub message: String,
}

/// Decode entity references in text or attribute content
///
/// Returns Borrowed if no entities are present.
pub fn clean(input: &str) -> Result<Cow<'_, str>, EntityError> {
    let bytes = input.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &bytes[pos..]) {
        let start = pos + amp;
        result.push_str(&input[pos..start]);

        let semi = memchr(b';', &bytes[start..]).ok_or_else(|| EntityError {
            offset: start,
            message: "unterminated entity reference".to_string(),
        })?;
        let entity = &input[start + 1..start + semi];
        let decoded = decode_entity(entity).ok_or_else(|| EntityError {
            offset: start,
            message: format!("invalid entity '&{entity};'"),
        })?;
        result.push(decoded);
        pos = start + semi + 1;
    }
    result.push_str(&input[pos..]);

    Ok(Cow::Owned(result))
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    match entity.strip_prefix('#') {
        Some(numeric) => decode_numeric_entity(numeric),
        None => named_entity(entity),
    }
}

/// Decode a numeric character reference (`#` already removed)
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix('x') {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !entity.is_empty() && entity.bytes().all(|b| b.is_ascii_digit()) => {
            entity.parse::<u32>().ok()?
        }
        None => return None,
    };
    char::from_u32(codepoint)
}

/// Check if a character may be written without escaping
#[inline]
fn is_safe(c: char) -> bool {
    matches!(c as u32,
        0x20..=0x7E |
        0xA1..=0xD7FF |
        0xE000..=0xFFFD
    ) && entity_for(c).is_none()
}

/// Escape text or attribute content, appending to a buffer
pub fn escape_into(input: &str, buf: &mut String) {
    for c in input.chars() {
        if is_safe(c) {
            buf.push(c);
        } else if let Some(name) = entity_for(c) {
            buf.push('&');
            buf.push_str(name);
            buf.push(';');
        } else {
            push_hex_reference(c as u32, buf);
        }
    }
}

/// Write `&#x..;` with lower-case digits padded to an even count
fn push_hex_reference(codepoint: u32, buf: &mut String) {
    let digits = format!("{codepoint:x}");
    buf.push_str("&#x");
    if digits.len() % 2 == 1 {
        buf.push('0');
    }
    buf.push_str(&digits);
    buf.push(';');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(input: &str) -> String {
        let mut buf = String::new();
        escape_into(input, &mut buf);
        buf
    }

    #[test]
    fn test_no_entities() {
        let result = clean("Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = clean("&lt;hello&gt; &amp; &quot;world&quot; &apos;").unwrap();
        assert_eq!(result, "<hello> & \"world\" '");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(clean("&#65;&#66;&#67;").unwrap(), "ABC");
        assert_eq!(clean("&#x41;&#x42;&#x43;").unwrap(), "ABC");
        assert_eq!(clean("&#x1f600;").unwrap(), "😀");
        assert_eq!(clean("&#x00;").unwrap(), "\u{0}");
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let err = clean("a &nbsp; b").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.contains("&nbsp;"));
    }

    #[test]
    fn test_malformed_references_rejected() {
        assert!(clean("fish & chips").is_err());
        assert!(clean("&#;").is_err());
        assert!(clean("&#x;").is_err());
        assert!(clean("&#xZZ;").is_err());
        assert!(clean("&#-1;").is_err());
        assert!(clean("&#xD800;").is_err());
        assert!(clean("&#X41;").is_err());
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }

    #[test]
    fn test_escape_numeric() {
        assert_eq!(escape("a\tb\n"), "a&#x09;b&#x0a;");
        assert_eq!(escape("\u{7f}\u{a0}\u{a1}"), "&#x7f;&#xa0;\u{a1}");
        assert_eq!(escape("\u{fffe}"), "&#xfffe;");
        assert_eq!(escape("\u{1f600}"), "&#x01f600;");
        assert_eq!(escape("\u{0}"), "&#x00;");
    }

    #[test]
    fn test_escape_appends() {
        let mut buf = String::from("<a>");
        escape_into("plain text é & more", &mut buf);
        assert_eq!(buf, "<a>plain text é &amp; more");
    }

    #[test]
    fn test_escape_clean_symmetry() {
        for cp in 0u32..=0xFFFF {
            let Some(c) = char::from_u32(cp) else { continue };
            let original = c.to_string();
            let escaped = escape(&original);
            assert_eq!(clean(&escaped).unwrap(), original, "code point {cp:#x}");
            if is_safe(c) {
                assert_eq!(escaped, original);
            }
        }
    }
}
