//! Markup parser
//!
//! Single forward pass over the text. The top-level loop expects `<` and
//! dispatches on the next character:
//! - name start: open tag, attributes, then element content
//! - `/`: closing tag
//! - `!--`: comment (skipped)
//! - `![CDATA[`: raw section handed to the builder
//! - `?`: processing instruction (skipped)
//!
//! Structure is delegated to the [`TreeBuilder`]; its violations are reported
//! as [`ParseError`] with the line and an excerpt of the offending input.

use super::chars::{is_name_start, is_whitespace};
use super::entities::{clean, EntityError};
use super::scanner::Scanner;
use crate::dom::builder::TreeBuilder;
use crate::dom::revive::{revive, Reviver};
use crate::dom::Node;
use crate::error::{BuilderError, ParseError};
use std::borrow::Cow;

/// Parse markup into a document tree, then apply the optional reviver
pub fn parse(text: &str, reviver: Option<Reviver<'_>>) -> Result<Node, ParseError> {
    log::trace!("parsing {} bytes", text.len());
    let document = Parser::new(text).parse()?;
    Ok(revive(document, reviver))
}

/// Parse markup supplied as raw bytes, which must be UTF-8
pub fn parse_bytes(input: &[u8], reviver: Option<Reviver<'_>>) -> Result<Node, ParseError> {
    match std::str::from_utf8(input) {
        Ok(text) => parse(text, reviver),
        Err(err) => {
            let valid = &input[..err.valid_up_to()];
            // The prefix is valid UTF-8 by construction
            let prefix = std::str::from_utf8(valid).unwrap_or_default();
            let scanner = Scanner::new(prefix);
            Err(ParseError {
                message: "invalid UTF-8 in input".to_string(),
                line: scanner.line_at(prefix.len()),
                excerpt: String::from_utf8_lossy(&input[valid.len()..])
                    .chars()
                    .take(8)
                    .collect(),
            })
        }
    }
}

/// Recursive-descent parser state for one document
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    builder: TreeBuilder,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            scanner: Scanner::new(input),
            builder: TreeBuilder::new(),
        }
    }

    /// Parse the whole input into a document tree
    pub fn parse(mut self) -> Result<Node, ParseError> {
        self.scanner.skip_whitespace();
        while !self.scanner.is_eof() {
            let start = self.scanner.position();
            if !self.scanner.eat(b"<") {
                return Err(self.error_at(start, "expected '<'"));
            }
            match self.scanner.peek() {
                Some(b'/') => self.parse_close_tag(start)?,
                Some(b'!') => self.parse_bang(start)?,
                Some(b'?') => self.parse_processing_instruction(start)?,
                Some(b) if is_name_start(b) => self.parse_open_tag(start)?,
                _ => return Err(self.error_at(start, "invalid tag")),
            }
            self.scanner.skip_whitespace();
        }

        let end = self.scanner.position();
        std::mem::take(&mut self.builder)
            .finish()
            .map_err(|e| self.error_at(end, e.to_string()))
    }

    /// `<name attr="v" ...>` or `<name ... />`, cursor after `<`
    fn parse_open_tag(&mut self, start: usize) -> Result<(), ParseError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error_at(start, "invalid tag name"))?;
        self.builder
            .push(name)
            .map_err(|e| self.builder_error(start, e))?;

        loop {
            self.scanner.skip_whitespace();
            let pos = self.scanner.position();
            match self.scanner.peek() {
                Some(b'/') => {
                    if !self.scanner.eat(b"/>") {
                        return Err(self.error_at(pos, "expected '/>'"));
                    }
                    return self
                        .builder
                        .pop(None)
                        .map_err(|e| self.builder_error(pos, e));
                }
                Some(b'>') => {
                    self.scanner.advance(1);
                    return self.parse_content();
                }
                Some(b) if is_name_start(b) => self.parse_attribute()?,
                Some(_) => return Err(self.error_at(pos, "invalid attribute")),
                None => return Err(self.error_at(pos, "unterminated tag")),
            }
        }
    }

    /// `name = "value"` or `name = 'value'`
    fn parse_attribute(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error_at(start, "invalid attribute name"))?;

        self.scanner.skip_whitespace();
        let pos = self.scanner.position();
        if !self.scanner.eat(b"=") {
            return Err(self.error_at(pos, "expected '=' after attribute name"));
        }
        self.scanner.skip_whitespace();

        let pos = self.scanner.position();
        let quote = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_at(pos, "expected quoted attribute value")),
        };
        self.scanner.advance(1);
        let value_start = self.scanner.position();
        let value_end = self
            .scanner
            .find_byte(quote)
            .ok_or_else(|| self.error_at(pos, "unterminated attribute value"))?;
        let raw = self.scanner.slice(value_start, value_end);
        self.scanner.advance(value_end - value_start + 1);

        let value = self.decode(raw, value_start)?.into_owned();
        self.builder
            .set_attribute(name, value)
            .map_err(|e| self.builder_error(start, e))
    }

    /// Text after an open tag, up to the next markup that is not a comment
    ///
    /// Text directly followed by a closing tag becomes the element's value.
    /// Text followed by anything else must be whitespace.
    fn parse_content(&mut self) -> Result<(), ParseError> {
        let content_start = self.scanner.position();
        let mut text: Cow<'a, str> = Cow::Borrowed("");

        loop {
            let start = self.scanner.position();
            let end = self
                .scanner
                .find_tag_start()
                .ok_or_else(|| self.error_at(content_start, "unterminated element content"))?;
            let segment = self.scanner.slice(start, end);
            self.scanner.advance(end - start);

            let decoded = self.decode(segment, start)?;
            if text.is_empty() {
                text = decoded;
            } else {
                text.to_mut().push_str(&decoded);
            }

            if !self.scanner.starts_with(b"<!--") {
                break;
            }
            self.skip_comment()?;
        }

        if self.scanner.starts_with(b"</") {
            let pos = self.scanner.position();
            return self
                .builder
                .set_value(text.into_owned())
                .map_err(|e| self.builder_error(pos, e));
        }

        if !text.bytes().all(is_whitespace) {
            return Err(self.error_at(
                content_start,
                "text cannot be mixed with child elements",
            ));
        }
        Ok(())
    }

    /// `</name>` or `</>`, cursor after `<`
    fn parse_close_tag(&mut self, start: usize) -> Result<(), ParseError> {
        self.scanner.advance(1);
        let name = self.scanner.read_name();
        self.scanner.skip_whitespace();
        let pos = self.scanner.position();
        if !self.scanner.eat(b">") {
            return Err(self.error_at(pos, "expected '>' in closing tag"));
        }
        self.builder
            .pop(name)
            .map_err(|e| self.builder_error(start, e))
    }

    /// Comment or CDATA section, cursor after `<`
    fn parse_bang(&mut self, start: usize) -> Result<(), ParseError> {
        if self.scanner.starts_with(b"!--") {
            self.scanner.advance(3);
            return self
                .scanner
                .read_until(b"-->")
                .map(|_| ())
                .ok_or_else(|| self.error_at(start, "unterminated comment"));
        }

        if self.scanner.eat(b"![CDATA[") {
            let text = self
                .scanner
                .read_until(b"]]>")
                .ok_or_else(|| self.error_at(start, "unterminated CDATA section"))?;
            return self
                .builder
                .set_cdata(text)
                .map_err(|e| self.builder_error(start, e));
        }

        Err(self.error_at(start, "unsupported markup declaration"))
    }

    /// `<?target ...?>`, cursor after `<`
    fn parse_processing_instruction(&mut self, start: usize) -> Result<(), ParseError> {
        self.scanner.advance(1);
        self.scanner
            .read_until(b"?>")
            .map(|_| ())
            .ok_or_else(|| self.error_at(start, "unterminated processing instruction"))
    }

    /// `<!-- ... -->`, cursor on the `<`
    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(4);
        self.scanner
            .read_until(b"-->")
            .map(|_| ())
            .ok_or_else(|| self.error_at(start, "unterminated comment"))
    }

    /// Entity-decode a slice that starts at byte offset `offset`
    fn decode(&self, raw: &'a str, offset: usize) -> Result<Cow<'a, str>, ParseError> {
        clean(raw).map_err(|EntityError { offset: rel, message }| {
            self.error_at(offset + rel, message)
        })
    }

    fn builder_error(&self, pos: usize, err: BuilderError) -> ParseError {
        self.error_at(pos, err.to_string())
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> ParseError {
        let err = ParseError {
            message: message.into(),
            line: self.scanner.line_at(pos),
            excerpt: self.scanner.excerpt_at(pos),
        };
        log::debug!("rejected markup: {err}");
        err
    }
}
