//! Tree Builder
//!
//! Turns structural events from the parser into a node tree:
//! - Open elements live in an arena of frames; the parent relation is an index
//! - Closed frames are collapsed to their simplest shape and spliced into the
//!   parent's child map (repeated names become sequences)
//! - Shape-mixing rules are enforced as events arrive

use super::node::{append_child, Attributes, Children, Content, Element, Node, MAX_DEPTH};
use crate::error::BuilderError;

/// Index of a frame in the builder arena
type FrameId = usize;

/// Frame 0 stands for the document itself
const DOCUMENT: FrameId = 0;

/// An element under construction
#[derive(Debug, Default)]
struct Frame {
    /// Enclosing frame (None only for the document frame)
    parent: Option<FrameId>,
    /// Tag name
    name: String,
    attributes: Option<Attributes>,
    value: Option<String>,
    cdata: Option<String>,
    children: Children,
    /// Number of child elements opened under this frame
    child_count: usize,
}

impl Frame {
    /// Collapse a finished frame into its node shape
    fn into_node(self) -> Node {
        let content = match (self.cdata, self.value) {
            (Some(cdata), _) => Content::Cdata(cdata),
            (None, Some(value)) if self.attributes.is_none() => return Node::Text(value),
            (None, Some(value)) => Content::Value(value),
            (None, None) => Content::Children(self.children),
        };
        Node::Element(Element {
            attributes: self.attributes,
            content,
        })
    }
}

/// Incremental builder driven by the parser
#[derive(Debug)]
pub struct TreeBuilder {
    /// Open frames; the last one is the element currently being filled
    frames: Vec<Frame>,
}

impl TreeBuilder {
    /// Create a builder holding only the document frame
    pub fn new() -> Self {
        let mut frames = Vec::with_capacity(16);
        frames.push(Frame::default());
        TreeBuilder { frames }
    }

    /// Number of currently open elements
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Name of the innermost open element
    pub fn current_name(&self) -> Option<&str> {
        if self.depth() == 0 {
            None
        } else {
            self.frames.last().map(|f| f.name.as_str())
        }
    }

    #[inline]
    fn current_id(&self) -> FrameId {
        self.frames.len() - 1
    }

    #[inline]
    fn current(&mut self) -> &mut Frame {
        let id = self.current_id();
        &mut self.frames[id]
    }

    /// Current frame, which must be an element rather than the document
    fn current_element(&mut self) -> Result<&mut Frame, BuilderError> {
        if self.current_id() == DOCUMENT {
            return Err(BuilderError::OutsideRoot);
        }
        Ok(self.current())
    }

    /// Open a child element
    pub fn push(&mut self, name: &str) -> Result<(), BuilderError> {
        if self.depth() >= MAX_DEPTH {
            return Err(BuilderError::TooDeep(MAX_DEPTH));
        }
        let parent = self.current_id();
        let frame = self.current();
        if frame.value.is_some() || frame.cdata.is_some() {
            return Err(BuilderError::ChildAfterValue);
        }
        if parent == DOCUMENT && frame.child_count > 0 {
            return Err(BuilderError::MultipleRoots);
        }
        frame.child_count += 1;

        self.frames.push(Frame {
            parent: Some(parent),
            name: name.to_string(),
            ..Frame::default()
        });
        Ok(())
    }

    /// Close the innermost element, optionally checking its name
    pub fn pop(&mut self, name: Option<&str>) -> Result<(), BuilderError> {
        if self.current_id() == DOCUMENT {
            return Err(BuilderError::UnexpectedClose);
        }
        if let Some(found) = name {
            let expected = &self.current().name;
            if expected != found {
                return Err(BuilderError::ClosingTagMismatch {
                    expected: expected.clone(),
                    found: found.to_string(),
                });
            }
        }

        let Some(mut frame) = self.frames.pop() else {
            return Err(BuilderError::UnexpectedClose);
        };
        let parent = frame.parent.unwrap_or(DOCUMENT);
        let name = std::mem::take(&mut frame.name);
        let node = frame.into_node();

        append_child(&mut self.frames[parent].children, name, node);
        Ok(())
    }

    /// Add an attribute to the innermost element
    pub fn set_attribute(&mut self, name: &str, value: String) -> Result<(), BuilderError> {
        let attributes = self
            .current_element()?
            .attributes
            .get_or_insert_with(Attributes::new);
        if attributes.contains_key(name) {
            return Err(BuilderError::DuplicateAttribute(name.to_string()));
        }
        attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Give the innermost element a scalar value
    pub fn set_value(&mut self, text: String) -> Result<(), BuilderError> {
        let frame = self.current_element()?;
        if frame.child_count > 0 {
            return Err(BuilderError::ValueAfterChildren);
        }
        if frame.cdata.is_some() {
            return Err(BuilderError::CdataValueConflict);
        }
        frame.value = Some(text);
        Ok(())
    }

    /// Give the innermost element CDATA content
    ///
    /// Consecutive CDATA sections are joined.
    pub fn set_cdata(&mut self, text: &str) -> Result<(), BuilderError> {
        let frame = self.current_element()?;
        if frame.child_count > 0 {
            return Err(BuilderError::ValueAfterChildren);
        }
        if frame.value.is_some() {
            return Err(BuilderError::CdataValueConflict);
        }
        frame.cdata.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    /// Produce the document, checking that exactly one root was closed
    pub fn finish(mut self) -> Result<Node, BuilderError> {
        if let Some(name) = self.current_name() {
            return Err(BuilderError::Unclosed(name.to_string()));
        }
        let document = self.current();
        if document.child_count == 0 {
            return Err(BuilderError::NoRoot);
        }
        let children = std::mem::take(&mut document.children);
        Ok(Node::element(Content::Children(children)))
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::Child;

    fn build(events: impl FnOnce(&mut TreeBuilder) -> Result<(), BuilderError>) -> Result<Node, BuilderError> {
        let mut builder = TreeBuilder::new();
        events(&mut builder)?;
        builder.finish()
    }

    #[test]
    fn test_scalar_collapses() {
        let doc = build(|b| {
            b.push("a")?;
            b.set_value("x".to_string())?;
            b.pop(Some("a"))
        })
        .unwrap();
        assert_eq!(doc, Node::document("a", Node::text("x")));
    }

    #[test]
    fn test_attributes_keep_wrapped_value() {
        let doc = build(|b| {
            b.push("a")?;
            b.set_attribute("x", "3".to_string())?;
            b.set_value(String::new())?;
            b.pop(None)
        })
        .unwrap();
        let (_, root) = doc.as_document().unwrap();
        match root {
            Node::Element(Element {
                attributes: Some(attrs),
                content: Content::Value(value),
            }) => {
                assert_eq!(attrs.get("x").map(String::as_str), Some("3"));
                assert!(value.is_empty());
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_repeated_children_become_sequence() {
        let doc = build(|b| {
            b.push("a")?;
            for v in ["3", "4"] {
                b.push("b")?;
                b.set_value(v.to_string())?;
                b.pop(Some("b"))?;
            }
            b.pop(Some("a"))
        })
        .unwrap();
        let (_, root) = doc.as_document().unwrap();
        assert_eq!(
            root.get("b"),
            Some(&Child::Many(vec![Node::text("3"), Node::text("4")]))
        );
    }

    #[test]
    fn test_value_then_child_rejected() {
        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.set_cdata("x").unwrap();
        assert_eq!(b.push("b"), Err(BuilderError::ChildAfterValue));
    }

    #[test]
    fn test_child_then_value_rejected() {
        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.push("b").unwrap();
        b.pop(None).unwrap();
        assert_eq!(b.set_value("x".to_string()), Err(BuilderError::ValueAfterChildren));
        assert_eq!(b.set_cdata("x"), Err(BuilderError::ValueAfterChildren));
    }

    #[test]
    fn test_cdata_value_conflict() {
        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.set_cdata("x").unwrap();
        assert_eq!(b.set_value("y".to_string()), Err(BuilderError::CdataValueConflict));
    }

    #[test]
    fn test_adjacent_cdata_joined() {
        let doc = build(|b| {
            b.push("a")?;
            b.set_cdata("]]")?;
            b.set_cdata(">")?;
            b.pop(None)
        })
        .unwrap();
        assert_eq!(
            doc.as_document().unwrap().1,
            &Node::element(Content::Cdata("]]>".to_string()))
        );
    }

    #[test]
    fn test_duplicate_attribute() {
        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.set_attribute("x", "1".to_string()).unwrap();
        assert_eq!(
            b.set_attribute("x", "2".to_string()),
            Err(BuilderError::DuplicateAttribute("x".to_string()))
        );
    }

    #[test]
    fn test_root_cardinality() {
        assert_eq!(build(|_| Ok(())), Err(BuilderError::NoRoot));

        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.pop(None).unwrap();
        assert_eq!(b.push("b"), Err(BuilderError::MultipleRoots));
    }

    #[test]
    fn test_unclosed_and_mismatch() {
        let mut b = TreeBuilder::new();
        b.push("a").unwrap();
        b.push("b").unwrap();
        assert_eq!(
            b.pop(Some("a")),
            Err(BuilderError::ClosingTagMismatch {
                expected: "b".to_string(),
                found: "a".to_string(),
            })
        );
        assert_eq!(b.finish(), Err(BuilderError::Unclosed("b".to_string())));
    }

    #[test]
    fn test_nesting_limit() {
        let mut b = TreeBuilder::new();
        for _ in 0..MAX_DEPTH {
            b.push("a").unwrap();
        }
        assert_eq!(b.depth(), MAX_DEPTH);
        assert_eq!(b.push("a"), Err(BuilderError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_close_without_open() {
        let mut b = TreeBuilder::new();
        assert_eq!(b.pop(None), Err(BuilderError::UnexpectedClose));
    }
}
