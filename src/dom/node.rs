//! Tree node representation
//!
//! A node is exactly one of: a scalar string, an element (attributes plus
//! one kind of content), or the null marker. Which form a tag takes is
//! decided once when the tree is built; consumers match on the variant.

use crate::error::SerializeError;
use indexmap::IndexMap;

/// Attribute name -> value, in document order
pub type Attributes = IndexMap<String, String>;

/// Child tag name -> occurrence(s), in order of first appearance
pub type Children = IndexMap<String, Child>;

/// Natural-shape key holding the attribute map
pub const ATTRIBUTES_KEY: &str = "$";
/// Natural-shape key holding an attributed scalar value
pub const VALUE_KEY: &str = "$value";
/// Natural-shape key holding a CDATA payload
pub const CDATA_KEY: &str = "$cdata";
/// Attribute standing for the null marker
pub const NIL_ATTRIBUTE: &str = "xsi:nil";

/// Maximum element nesting accepted when building a tree
///
/// Tree passes and `Drop` recurse once per level, so every producer of
/// trees (parser, serde and term bridges) stops here.
pub const MAX_DEPTH: usize = 256;

/// A value in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Explicit nil, written as `xsi:nil="true"`
    Null,
    /// Bare scalar text
    Text(String),
    /// Element with attributes and/or non-scalar content
    Element(Element),
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Attribute map, absent when the tag had none
    pub attributes: Option<Attributes>,
    pub content: Content,
}

/// What an element holds besides its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Scalar text kept beside attributes
    Value(String),
    /// Raw payload of a CDATA section
    Cdata(String),
    /// Child elements (possibly none)
    Children(Children),
}

impl Default for Content {
    fn default() -> Self {
        Content::Children(Children::new())
    }
}

/// One or more occurrences of a child tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    One(Node),
    Many(Vec<Node>),
}

impl Child {
    /// Append another occurrence, turning a single node into a sequence
    pub fn push(&mut self, node: Node) {
        match self {
            Child::Many(nodes) => nodes.push(node),
            Child::One(_) => {
                let previous = std::mem::replace(self, Child::Many(Vec::with_capacity(2)));
                if let (Child::One(first), Child::Many(nodes)) = (previous, &mut *self) {
                    nodes.push(first);
                    nodes.push(node);
                }
            }
        }
    }

    /// Iterate over the occurrences
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        match self {
            Child::One(node) => std::slice::from_ref(node).iter(),
            Child::Many(nodes) => nodes.iter(),
        }
    }

    /// Number of occurrences
    pub fn len(&self) -> usize {
        match self {
            Child::One(_) => 1,
            Child::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Add an occurrence of `name`, merging repeats into a sequence
pub fn append_child(children: &mut Children, name: String, node: Node) {
    match children.get_mut(&name) {
        Some(existing) => existing.push(node),
        None => {
            children.insert(name, Child::One(node));
        }
    }
}

impl Node {
    /// Scalar node from anything string-like
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Element with the given content and no attributes
    pub fn element(content: Content) -> Self {
        Node::Element(Element {
            attributes: None,
            content,
        })
    }

    /// Wrap a root node into a single-key document
    pub fn document(root_name: impl Into<String>, root: Node) -> Self {
        let mut children = Children::new();
        children.insert(root_name.into(), Child::One(root));
        Node::element(Content::Children(children))
    }

    /// Split a document into its root name and root node
    ///
    /// Returns None unless this is an attribute-free mapping with exactly one
    /// key holding a single node.
    pub fn as_document(&self) -> Option<(&str, &Node)> {
        match self {
            Node::Element(Element {
                attributes: None,
                content: Content::Children(children),
            }) if children.len() == 1 => match children.get_index(0) {
                Some((name, Child::One(root))) => Some((name.as_str(), root)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Attribute map, if this is an element carrying one
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Node::Element(element) => element.attributes.as_ref(),
            _ => None,
        }
    }

    /// Child map, if this is an element with element content
    pub fn children(&self) -> Option<&Children> {
        match self {
            Node::Element(Element {
                content: Content::Children(children),
                ..
            }) => Some(children),
            _ => None,
        }
    }

    /// Look up a child by tag name
    pub fn get(&self, name: &str) -> Option<&Child> {
        self.children()?.get(name)
    }

    /// Scalar text of a bare scalar node
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Accumulates the entries of an untyped natural-shape mapping
///
/// Shared by every bridge that turns `$`-keyed maps into nodes, so the
/// mixing rules are checked in one place.
#[derive(Debug, Default)]
pub struct ElementParts {
    attributes: Option<Attributes>,
    value: Option<String>,
    cdata: Option<String>,
    children: Children,
}

impl ElementParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attribute map (the `$` entry)
    pub fn attributes(&mut self, attributes: Attributes) {
        self.attributes = Some(attributes);
    }

    /// Set the scalar value (the `$value` entry)
    pub fn value(&mut self, value: String) {
        self.value = Some(value);
    }

    /// Set the CDATA payload (the `$cdata` entry)
    pub fn cdata(&mut self, cdata: String) {
        self.cdata = Some(cdata);
    }

    /// Add a child entry
    pub fn child(&mut self, name: String, child: Child) {
        self.children.insert(name, child);
    }

    /// Assemble the element, rejecting mixed content
    ///
    /// `tag` names the element in error messages.
    pub fn finish(self, tag: &str) -> Result<Node, SerializeError> {
        let has_children = !self.children.is_empty();
        let content = match (self.value, self.cdata) {
            (Some(_), Some(_)) => {
                return Err(SerializeError::MixedContent { tag: tag.to_string() })
            }
            (Some(_), None) | (None, Some(_)) if has_children => {
                return Err(SerializeError::MixedContent { tag: tag.to_string() })
            }
            (Some(value), None) => Content::Value(value),
            (None, Some(cdata)) => Content::Cdata(cdata),
            (None, None) => Content::Children(self.children),
        };
        Ok(Node::Element(Element {
            attributes: self.attributes,
            content,
        }))
    }
}
