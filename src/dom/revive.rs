//! Reviver pipeline
//!
//! Bottom-up rewrite of a tree with a caller-supplied transform. Children are
//! revived before their parent; each call receives the key the node is stored
//! under (tag name, or the index within a repeated tag) and the already
//! revived node. The root is called with the empty key.

use super::node::{Child, Content, Element, Node, NIL_ATTRIBUTE};

/// Per-node transform: `(key, node) -> replacement`
pub type Reviver<'a> = &'a dyn Fn(&str, Node) -> Node;

/// Apply a reviver to every node of a tree, identity when absent
///
/// Items of a repeated tag are each passed with their index as the key. The
/// sequence as a whole is never passed, since a reviver maps a single node.
pub fn revive(tree: Node, reviver: Option<Reviver<'_>>) -> Node {
    match reviver {
        Some(reviver) => revive_node("", tree, reviver),
        None => tree,
    }
}

fn revive_node(key: &str, node: Node, reviver: Reviver<'_>) -> Node {
    let node = match node {
        Node::Element(Element {
            attributes,
            content: Content::Children(children),
        }) => {
            let children = children
                .into_iter()
                .map(|(name, child)| {
                    let child = match child {
                        Child::One(node) => Child::One(revive_node(&name, node, reviver)),
                        Child::Many(nodes) => Child::Many(
                            nodes
                                .into_iter()
                                .enumerate()
                                .map(|(i, node)| revive_node(&i.to_string(), node, reviver))
                                .collect(),
                        ),
                    };
                    (name, child)
                })
                .collect();
            Node::Element(Element {
                attributes,
                content: Content::Children(children),
            })
        }
        leaf => leaf,
    };
    reviver(key, node)
}

/// Reference reviver collapsing the tree to its plainest form
///
/// - `xsi:nil="true"` becomes the null marker
/// - attributed values and CDATA become bare scalars
/// - attributes are dropped; an element left empty becomes the null marker
pub fn simplify(_key: &str, node: Node) -> Node {
    let element = match node {
        Node::Element(element) => element,
        leaf => return leaf,
    };

    let nil = element
        .attributes
        .as_ref()
        .and_then(|attrs| attrs.get(NIL_ATTRIBUTE))
        .is_some_and(|value| value == "true");
    if nil {
        return Node::Null;
    }

    match element.content {
        Content::Value(text) | Content::Cdata(text) => Node::Text(text),
        Content::Children(children) if children.is_empty() => Node::Null,
        content => Node::element(content),
    }
}
