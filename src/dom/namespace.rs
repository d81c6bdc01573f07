//! Namespace Normalization
//!
//! Rewrites `prefix:local` names into `uri|local` form across a tree:
//! - `xmlns` / `xmlns:p` attributes open bindings for the element's subtree
//!   and are removed from the output
//! - prefixed attributes are qualified; unprefixed attributes stay bare, and
//!   two attributes resolving to the same name are an error
//! - element names use their own prefix, else the default namespace
//! - siblings that resolve to the same name are merged into a sequence
//!
//! Bindings live on a stack-based resolver scoped per element.

use super::node::{append_child, Attributes, Child, Children, Content, Element, Node};
use crate::error::NamespaceError;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Separator between namespace URI and local name in qualified keys
pub const QUALIFIED_SEPARATOR: char = '|';

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
struct NsBinding {
    /// Empty for the default namespace
    prefix: String,
    uri: String,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: u16,
}

impl NamespaceResolver {
    /// Create a new namespace resolver with pre-declared xml and xmlns namespaces
    pub fn new() -> Self {
        let mut bindings = Vec::with_capacity(16);
        bindings.push(NsBinding {
            prefix: "xml".to_string(),
            uri: ns::XML.to_string(),
            depth: 0,
        });
        bindings.push(NsBinding {
            prefix: "xmlns".to_string(),
            uri: ns::XMLNS.to_string(),
            depth: 0,
        });
        NamespaceResolver { bindings, depth: 0 }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        // Don't allow redeclaring xml or xmlns
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }

        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
    }

    /// Resolve a prefix to a namespace URI
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
    }

    /// Resolve the default namespace (None when unset or undeclared with `xmlns=""`)
    pub fn resolve_default(&self) -> Option<&str> {
        self.resolve("").filter(|uri| !uri.is_empty())
    }

    /// Qualified key for an element name
    fn element_key(&self, name: &str) -> Result<String, NamespaceError> {
        match name.split_once(':') {
            Some((prefix, local)) => self.qualify(prefix, local, name),
            None => Ok(match self.resolve_default() {
                Some(uri) => format!("{uri}{QUALIFIED_SEPARATOR}{name}"),
                None => name.to_string(),
            }),
        }
    }

    /// Qualified key for an attribute name (the default namespace does not apply)
    fn attribute_key(&self, name: &str) -> Result<String, NamespaceError> {
        match name.split_once(':') {
            Some((prefix, local)) => self.qualify(prefix, local, name),
            None => Ok(name.to_string()),
        }
    }

    fn qualify(&self, prefix: &str, local: &str, name: &str) -> Result<String, NamespaceError> {
        match self.resolve(prefix) {
            Some(uri) => Ok(format!("{uri}{QUALIFIED_SEPARATOR}{local}")),
            None => {
                log::debug!("unbound namespace prefix in '{name}'");
                Err(NamespaceError::UnboundPrefix {
                    prefix: prefix.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace declaration carried by an attribute name, as its prefix
fn declared_prefix(attribute: &str) -> Option<&str> {
    if attribute == "xmlns" {
        Some("")
    } else {
        attribute.strip_prefix("xmlns:")
    }
}

/// Resolve every prefixed name in a tree
///
/// The top level must be a mapping (normally a parsed document); its entries
/// are resolved with no bindings in scope.
pub fn normalize_namespaces(tree: Node) -> Result<Node, NamespaceError> {
    let Node::Element(Element {
        attributes,
        content: Content::Children(children),
    }) = tree
    else {
        return Err(NamespaceError::NotADocument);
    };

    let mut resolver = NamespaceResolver::new();
    let children = normalize_children(children, &mut resolver)?;
    Ok(Node::Element(Element {
        attributes,
        content: Content::Children(children),
    }))
}

/// Resolve the children of one element, merging equal qualified names
fn normalize_children(
    children: Children,
    resolver: &mut NamespaceResolver,
) -> Result<Children, NamespaceError> {
    let mut normalized = Children::with_capacity(children.len());
    for (name, child) in children {
        match child {
            Child::One(node) => {
                let (key, node) = normalize_node(&name, node, resolver)?;
                append_child(&mut normalized, key, node);
            }
            Child::Many(nodes) => {
                for node in nodes {
                    let (key, node) = normalize_node(&name, node, resolver)?;
                    append_child(&mut normalized, key, node);
                }
            }
        }
    }
    Ok(normalized)
}

/// Resolve one element in its own scope, returning its qualified key
fn normalize_node(
    name: &str,
    node: Node,
    resolver: &mut NamespaceResolver,
) -> Result<(String, Node), NamespaceError> {
    resolver.push_scope();
    let result = normalize_scoped(name, node, resolver);
    resolver.pop_scope();
    result
}

fn normalize_scoped(
    name: &str,
    node: Node,
    resolver: &mut NamespaceResolver,
) -> Result<(String, Node), NamespaceError> {
    let Element {
        attributes,
        content,
    } = match node {
        Node::Element(element) => element,
        leaf => return Ok((resolver.element_key(name)?, leaf)),
    };

    let attributes = match attributes {
        Some(attributes) => normalize_attributes(attributes, resolver)?,
        None => None,
    };
    let content = match content {
        Content::Children(children) => Content::Children(normalize_children(children, resolver)?),
        other => other,
    };

    let key = resolver.element_key(name)?;
    let node = match (attributes, content) {
        (None, Content::Value(text)) => Node::Text(text),
        (attributes, content) => Node::Element(Element {
            attributes,
            content,
        }),
    };
    Ok((key, node))
}

/// Apply declarations to the current scope and qualify the remaining attributes
///
/// Returns None when only declarations were present.
fn normalize_attributes(
    attributes: Attributes,
    resolver: &mut NamespaceResolver,
) -> Result<Option<Attributes>, NamespaceError> {
    for (name, uri) in &attributes {
        if let Some(prefix) = declared_prefix(name) {
            resolver.declare(prefix, uri);
        }
    }

    let mut retained = Attributes::with_capacity(attributes.len());
    for (name, value) in attributes {
        if declared_prefix(&name).is_some() {
            continue;
        }
        let key = resolver.attribute_key(&name)?;
        if retained.contains_key(&key) {
            log::debug!("attribute '{name}' collides as '{key}'");
            return Err(NamespaceError::DuplicateAttribute { name: key });
        }
        retained.insert(key, value);
    }
    Ok((!retained.is_empty()).then_some(retained))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse;

    fn normalize(input: &str) -> Node {
        normalize_namespaces(parse(input, None).unwrap()).unwrap()
    }

    fn root(doc: &Node) -> (&str, &Node) {
        doc.as_document().unwrap()
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("svg", "http://www.w3.org/2000/svg");
        assert_eq!(resolver.resolve("svg"), Some("http://www.w3.org/2000/svg"));
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
    }

    #[test]
    fn test_scope_pop() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("foo", "http://example.com/foo");
        resolver.pop_scope();
        assert_eq!(resolver.resolve("foo"), None);
    }

    #[test]
    fn test_shadow_binding() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("ns", "http://example.com/ns1");
        resolver.push_scope();
        resolver.declare("ns", "http://example.com/ns2");
        assert_eq!(resolver.resolve("ns"), Some("http://example.com/ns2"));
        resolver.pop_scope();
        assert_eq!(resolver.resolve("ns"), Some("http://example.com/ns1"));
    }

    #[test]
    fn test_prefixed_root() {
        let doc = normalize("<t:a xmlns:t=\"xyz\"/>");
        assert_eq!(doc, Node::document("xyz|a", Node::element(Content::default())));
    }

    #[test]
    fn test_prefixed_attributes() {
        let doc = normalize("<a xmlns:p=\"urn:p\" p:x=\"1\" y=\"2\"/>");
        let (name, a) = root(&doc);
        assert_eq!(name, "a");
        let attrs = a.attributes().unwrap();
        assert_eq!(attrs.keys().collect::<Vec<_>>(), ["urn:p|x", "y"]);
        assert_eq!(attrs.get("y").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_default_namespace_skips_attributes() {
        let doc = normalize("<a xmlns=\"urn:d\" k=\"v\"><b>1</b><c:e xmlns:c=\"urn:c\"/></a>");
        let (name, a) = root(&doc);
        assert_eq!(name, "urn:d|a");
        assert_eq!(a.attributes().unwrap().get("k").map(String::as_str), Some("v"));
        assert_eq!(a.get("urn:d|b"), Some(&Child::One(Node::text("1"))));
        assert!(a.get("urn:c|e").is_some());
    }

    #[test]
    fn test_declaration_only_attributes_collapse() {
        let doc = normalize("<a><b xmlns:q=\"urn:q\">text</b></a>");
        let (_, a) = root(&doc);
        assert_eq!(a.get("b"), Some(&Child::One(Node::text("text"))));
    }

    #[test]
    fn test_siblings_do_not_share_declarations() {
        let doc = parse("<a><p:b xmlns:p=\"urn:1\"/><p:b/></a>", None).unwrap();
        assert_eq!(
            normalize_namespaces(doc),
            Err(NamespaceError::UnboundPrefix {
                prefix: "p".to_string(),
                name: "p:b".to_string(),
            })
        );
    }

    #[test]
    fn test_redeclaration_in_nested_scope() {
        let doc = normalize(concat!(
            "<p:a xmlns:p=\"urn:outer\">",
            "<p:b xmlns:p=\"urn:inner\"><p:c>1</p:c></p:b>",
            "<p:c>2</p:c>",
            "</p:a>"
        ));
        let (name, a) = root(&doc);
        assert_eq!(name, "urn:outer|a");
        let Some(Child::One(b)) = a.get("urn:inner|b") else {
            panic!("missing inner b in {a:?}");
        };
        assert_eq!(b.get("urn:inner|c"), Some(&Child::One(Node::text("1"))));
        assert_eq!(a.get("urn:outer|c"), Some(&Child::One(Node::text("2"))));
    }

    #[test]
    fn test_same_uri_different_prefixes_merge() {
        let doc = normalize(concat!(
            "<r xmlns:x=\"urn:s\" xmlns:y=\"urn:s\">",
            "<x:item>1</x:item><other/><y:item>2</y:item>",
            "</r>"
        ));
        let (_, r) = root(&doc);
        assert_eq!(
            r.get("urn:s|item"),
            Some(&Child::Many(vec![Node::text("1"), Node::text("2")]))
        );
        let keys: Vec<_> = r.children().unwrap().keys().collect();
        assert_eq!(keys, ["urn:s|item", "other"]);
    }

    #[test]
    fn test_undeclared_default_namespace() {
        let doc = normalize("<a xmlns=\"urn:d\"><b xmlns=\"\">1</b></a>");
        let (_, a) = root(&doc);
        assert_eq!(a.get("b"), Some(&Child::One(Node::text("1"))));
    }

    #[test]
    fn test_xml_prefix_prebound() {
        let doc = normalize("<a xml:lang=\"en\"/>");
        let (_, a) = root(&doc);
        let key = format!("{}|lang", ns::XML);
        assert_eq!(a.attributes().unwrap().get(&key).map(String::as_str), Some("en"));
    }

    #[test]
    fn test_attributes_colliding_after_resolution() {
        let doc = parse("<a xmlns:p=\"u\" xmlns:q=\"u\" p:x=\"1\" q:x=\"2\"/>", None).unwrap();
        assert_eq!(
            normalize_namespaces(doc),
            Err(NamespaceError::DuplicateAttribute {
                name: "u|x".to_string(),
            })
        );

        // Same local name under different URIs stays distinct
        let doc = normalize("<a xmlns:p=\"u\" xmlns:q=\"v\" p:x=\"1\" q:x=\"2\"/>");
        let (_, a) = root(&doc);
        assert_eq!(a.attributes().unwrap().len(), 2);
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert_eq!(
            normalize_namespaces(Node::text("x")),
            Err(NamespaceError::NotADocument)
        );
    }
}
