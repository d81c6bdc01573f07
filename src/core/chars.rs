//! Character classification tables
//!
//! Byte-indexed lookup tables for the ASCII range. Bytes >= 0x80 belong to
//! multi-byte UTF-8 sequences and are accepted anywhere inside a name.

const NAME_START: u8 = 1;
const NAME_CHAR: u8 = 2;
const WHITESPACE: u8 = 4;

static CLASSES: [u8; 128] = build_classes();

const fn build_classes() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut b = 0;
    while b < 128 {
        let c = b as u8;
        let start = c.is_ascii_alphabetic() || c == b'_' || c == b':';
        if start {
            table[b] |= NAME_START | NAME_CHAR;
        }
        if c.is_ascii_digit() || c == b'-' || c == b'.' {
            table[b] |= NAME_CHAR;
        }
        if c == b' ' || c == b'\t' || c == b'\n' || c == b'\r' {
            table[b] |= WHITESPACE;
        }
        b += 1;
    }
    table
}

/// The five predefined entities and the characters they stand for
pub static ENTITIES: [(&str, char); 5] = [
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
];

/// Check if byte can start a tag or attribute name
#[inline]
pub fn is_name_start(b: u8) -> bool {
    b >= 0x80 || CLASSES[b as usize] & NAME_START != 0
}

/// Check if byte can continue a tag or attribute name
#[inline]
pub fn is_name_char(b: u8) -> bool {
    b >= 0x80 || CLASSES[b as usize] & NAME_CHAR != 0
}

/// Check if byte is XML whitespace (space, tab, newline, carriage return)
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    b < 0x80 && CLASSES[b as usize] & WHITESPACE != 0
}

/// Look up a named entity (without `&` and `;`)
#[inline]
pub fn named_entity(name: &str) -> Option<char> {
    ENTITIES.iter().find(|(n, _)| *n == name).map(|&(_, c)| c)
}

/// Named entity used to escape a character on output, if any
#[inline]
pub fn entity_for(c: char) -> Option<&'static str> {
    ENTITIES.iter().find(|&&(_, ch)| ch == c).map(|&(n, _)| n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_classes() {
        assert!(is_name_start(b'a'));
        assert!(is_name_start(b'_'));
        assert!(is_name_start(b':'));
        assert!(!is_name_start(b'1'));
        assert!(!is_name_start(b'-'));
        assert!(is_name_char(b'1'));
        assert!(is_name_char(b'-'));
        assert!(is_name_char(b'.'));
        assert!(!is_name_char(b'='));
        assert!(is_name_start(0xC3));
    }

    #[test]
    fn test_whitespace() {
        for b in [b' ', b'\t', b'\n', b'\r'] {
            assert!(is_whitespace(b));
        }
        assert!(!is_whitespace(b'x'));
        assert!(!is_whitespace(0xA0));
    }

    #[test]
    fn test_entities() {
        assert_eq!(named_entity("amp"), Some('&'));
        assert_eq!(named_entity("nbsp"), None);
        assert_eq!(entity_for('\''), Some("apos"));
        assert_eq!(entity_for('x'), None);
    }
}
