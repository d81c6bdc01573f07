//! Markup serialization
//!
//! Inverse of the builder's shape rules:
//! - a sequence becomes one tag per item
//! - the null marker becomes `<tag xsi:nil="true"/>`
//! - a scalar becomes `<tag>text</tag>`, never self-closing
//! - an element writes its attributes, then its value, CDATA or children
//!   (self-closing when it has none)
//!
//! Walks the tree with an explicit stack instead of recursion.

use crate::core::entities::escape_into;
use crate::dom::node::{Content, Element, Node, NIL_ATTRIBUTE};
use crate::error::SerializeError;

/// Output formatting options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringifyOptions {
    /// Per-level indentation; None or empty produces compact output
    pub indent: Option<String>,
}

impl StringifyOptions {
    /// Compact output with no inserted whitespace
    pub fn compact() -> Self {
        Self::default()
    }

    /// Pretty output indenting each level with `indent`
    pub fn indented(indent: impl Into<String>) -> Self {
        StringifyOptions {
            indent: Some(indent.into()),
        }
    }
}

/// Serialize a single-root document to markup
pub fn stringify(tree: &Node, options: &StringifyOptions) -> Result<String, SerializeError> {
    let (name, root) = tree.as_document().ok_or(SerializeError::NotADocument)?;
    let indent = options.indent.as_deref().filter(|s| !s.is_empty());

    let mut writer = Writer {
        buf: String::with_capacity(1024),
        indent,
    };
    writer.write(name, root);
    log::trace!("serialized {} bytes", writer.buf.len());
    Ok(writer.buf)
}

/// Stack entries: either entering a node or writing a closing tag
enum StackEntry<'t> {
    Enter(&'t str, &'t Node, usize),
    Close(&'t str, usize),
}

struct Writer<'o> {
    buf: String,
    indent: Option<&'o str>,
}

impl Writer<'_> {
    fn write(&mut self, root_name: &str, root: &Node) {
        let mut stack: Vec<StackEntry<'_>> = Vec::with_capacity(64);
        stack.push(StackEntry::Enter(root_name, root, 0));

        while let Some(entry) = stack.pop() {
            match entry {
                StackEntry::Close(name, depth) => {
                    self.newline(depth);
                    self.close_tag(name);
                }
                StackEntry::Enter(name, node, depth) => {
                    if depth > 0 {
                        self.newline(depth);
                    }
                    match node {
                        Node::Null => {
                            self.buf.push('<');
                            self.buf.push_str(name);
                            self.attribute(NIL_ATTRIBUTE, "true");
                            self.buf.push_str("/>");
                        }
                        Node::Text(text) => {
                            self.open_tag(name);
                            escape_into(text, &mut self.buf);
                            self.close_tag(name);
                        }
                        Node::Element(Element { attributes, content }) => {
                            self.buf.push('<');
                            self.buf.push_str(name);
                            for (key, value) in attributes.iter().flatten() {
                                self.attribute(key, value);
                            }

                            match content {
                                Content::Value(text) => {
                                    self.buf.push('>');
                                    escape_into(text, &mut self.buf);
                                    self.close_tag(name);
                                }
                                Content::Cdata(text) => {
                                    self.buf.push('>');
                                    self.cdata(text);
                                    self.close_tag(name);
                                }
                                Content::Children(children) if children.is_empty() => {
                                    self.buf.push_str("/>");
                                }
                                Content::Children(children) => {
                                    self.buf.push('>');
                                    // Closing tag first so it is popped after the children
                                    stack.push(StackEntry::Close(name, depth));
                                    for (child_name, child) in children.iter().rev() {
                                        for node in child.iter().rev() {
                                            stack.push(StackEntry::Enter(child_name, node, depth + 1));
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Line break plus indentation, only in indented mode
    fn newline(&mut self, depth: usize) {
        if let Some(indent) = self.indent {
            self.buf.push('\n');
            for _ in 0..depth {
                self.buf.push_str(indent);
            }
        }
    }

    fn open_tag(&mut self, name: &str) {
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
    }

    fn close_tag(&mut self, name: &str) {
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    fn attribute(&mut self, name: &str, value: &str) {
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        escape_into(value, &mut self.buf);
        self.buf.push('"');
    }

    /// CDATA section; an embedded `]]>` is split across two sections
    fn cdata(&mut self, text: &str) {
        self.buf.push_str("<![CDATA[");
        let mut rest = text;
        while let Some(pos) = rest.find("]]>") {
            self.buf.push_str(&rest[..pos + 2]);
            self.buf.push_str("]]><![CDATA[");
            rest = &rest[pos + 2..];
        }
        self.buf.push_str(rest);
        self.buf.push_str("]]>");
    }
}
