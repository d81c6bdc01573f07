//! SIMD-accelerated cursor over markup text using memchr
//!
//! The scanner only moves forward. Delimiter searches use memchr/memmem;
//! positions are byte offsets into the original `&str` and always land on
//! ASCII delimiters, so slices taken between them are valid UTF-8.

use super::chars::{is_name_char, is_name_start, is_whitespace};
use memchr::{memchr, memchr_iter, memmem};

/// Maximum number of characters shown in error excerpts
const EXCERPT_CHARS: usize = 24;

/// Forward-only cursor over markup text
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get a slice from start to end positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace characters
    #[inline]
    pub fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && is_whitespace(bytes[self.pos]) {
            self.pos += 1;
        }
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(needle)
    }

    /// Consume `needle` if the input continues with it
    #[inline]
    pub fn eat(&mut self, needle: &[u8]) -> bool {
        if self.starts_with(needle) {
            self.pos += needle.len();
            true
        } else {
            false
        }
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input.as_bytes()[self.pos..]).map(|i| self.pos + i)
    }

    /// Find next '<' (tag start)
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        self.find_byte(b'<')
    }

    /// Read up to `terminator`, returning the text before it and moving past it
    pub fn read_until(&mut self, terminator: &[u8]) -> Option<&'a str> {
        let start = self.pos;
        let offset = memmem::find(&self.input.as_bytes()[start..], terminator)?;
        self.pos = start + offset + terminator.len();
        Some(&self.input[start..start + offset])
    }

    /// Read a tag or attribute name
    pub fn read_name(&mut self) -> Option<&'a str> {
        let bytes = self.input.as_bytes();
        let start = self.pos;

        if !bytes.get(start).copied().is_some_and(is_name_start) {
            return None;
        }
        self.pos += 1;

        while self.pos < bytes.len() && is_name_char(bytes[self.pos]) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }

    /// 1-based line number of a byte offset
    pub fn line_at(&self, pos: usize) -> usize {
        let end = pos.min(self.input.len());
        memchr_iter(b'\n', &self.input.as_bytes()[..end]).count() + 1
    }

    /// Short piece of input starting at a byte offset
    pub fn excerpt_at(&self, pos: usize) -> String {
        let mut start = pos.min(self.input.len());
        while !self.input.is_char_boundary(start) {
            start -= 1;
        }
        self.input[start..].chars().take(EXCERPT_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new("hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new("ns:element-name.v2>");
        assert_eq!(scanner.read_name(), Some("ns:element-name.v2"));
        assert_eq!(scanner.position(), 18);
        assert_eq!(scanner.read_name(), None);
    }

    #[test]
    fn test_read_name_rejects_digit_start() {
        let mut scanner = Scanner::new("1abc");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::new("  \t\n hello");
        scanner.skip_whitespace();
        assert_eq!(scanner.position(), 5);
    }

    #[test]
    fn test_read_until() {
        let mut scanner = Scanner::new(" a comment -->rest");
        assert_eq!(scanner.read_until(b"-->"), Some(" a comment "));
        assert!(scanner.starts_with(b"rest"));
        assert_eq!(scanner.read_until(b"]]>"), None);
    }

    #[test]
    fn test_line_and_excerpt() {
        let scanner = Scanner::new("<a>\n<b>\n</c>\n</a>");
        assert_eq!(scanner.line_at(0), 1);
        assert_eq!(scanner.line_at(8), 3);
        assert_eq!(scanner.excerpt_at(8), "</c>\n</a>");
    }
}
