//! Elixir Term Conversion
//!
//! Trees cross the NIF boundary in their natural shape:
//! - text as a binary, the null marker as `nil`
//! - elements as maps keyed by binaries (`"$"`, `"$value"`, `"$cdata"`, tag names)
//! - repeated tags as lists
//!
//! Atom keys are accepted on the way in; unknown `$` keys and nesting beyond
//! [`MAX_DEPTH`] are rejected. BEAM maps do not keep insertion
//! order, so key order is only preserved on the Rust side.

use crate::dom::node::{
    Attributes, Child, Content, Element, ElementParts, Node, ATTRIBUTES_KEY, CDATA_KEY, MAX_DEPTH,
    VALUE_KEY,
};
use crate::error::{NamespaceError, ParseError, SerializeError};
use rustler::types::atom;
use rustler::types::map::MapIterator;
use rustler::{Encoder, Env, NewBinary, NifResult, Term};

rustler::atoms! {
    parse_error,
    serialize_error,
    namespace_error,
}

/// Convert a node to an Elixir term
pub fn node_to_term<'a>(env: Env<'a>, node: &Node) -> NifResult<Term<'a>> {
    match node {
        Node::Null => Ok(atom::nil().encode(env)),
        Node::Text(text) => Ok(str_to_binary(env, text)),
        Node::Element(Element { attributes, content }) => {
            let mut pairs = Vec::with_capacity(2);
            if let Some(attributes) = attributes {
                let attr_pairs: Vec<_> = attributes
                    .iter()
                    .map(|(name, value)| (str_to_binary(env, name), str_to_binary(env, value)))
                    .collect();
                pairs.push((
                    str_to_binary(env, ATTRIBUTES_KEY),
                    Term::map_from_pairs(env, &attr_pairs)?,
                ));
            }
            match content {
                Content::Value(text) => {
                    pairs.push((str_to_binary(env, VALUE_KEY), str_to_binary(env, text)));
                }
                Content::Cdata(text) => {
                    pairs.push((str_to_binary(env, CDATA_KEY), str_to_binary(env, text)));
                }
                Content::Children(children) => {
                    for (name, child) in children {
                        pairs.push((str_to_binary(env, name), child_to_term(env, child)?));
                    }
                }
            }
            Term::map_from_pairs(env, &pairs)
        }
    }
}

fn child_to_term<'a>(env: Env<'a>, child: &Child) -> NifResult<Term<'a>> {
    match child {
        Child::One(node) => node_to_term(env, node),
        Child::Many(nodes) => {
            // Build in reverse with prepend
            let mut list = Term::list_new_empty(env);
            for node in nodes.iter().rev() {
                list = list.list_prepend(node_to_term(env, node)?);
            }
            Ok(list)
        }
    }
}

/// Convert an Elixir term in natural shape back into a node
pub fn term_to_node(term: Term<'_>) -> Result<Node, SerializeError> {
    node_from_term("", term, 0)
}

fn node_from_term(tag: &str, term: Term<'_>, depth: usize) -> Result<Node, SerializeError> {
    if term.is_binary() {
        return term
            .decode::<String>()
            .map(Node::Text)
            .map_err(|_| invalid(tag, "non UTF-8 binary"));
    }
    if is_nil(term) {
        return Ok(Node::Null);
    }
    if term.is_map() {
        if depth > MAX_DEPTH {
            return Err(SerializeError::TooDeep { limit: MAX_DEPTH });
        }
        return element_from_term(tag, term, depth);
    }
    Err(invalid(tag, "term"))
}

fn element_from_term(tag: &str, term: Term<'_>, depth: usize) -> Result<Node, SerializeError> {
    let entries = MapIterator::new(term).ok_or_else(|| invalid(tag, "map"))?;
    let mut parts = ElementParts::new();

    for (key, value) in entries {
        let key = key_to_string(tag, key)?;
        match key.as_str() {
            ATTRIBUTES_KEY if is_nil(value) => {}
            ATTRIBUTES_KEY => parts.attributes(attributes_from_term(tag, value)?),
            VALUE_KEY => parts.value(scalar(tag, value)?),
            CDATA_KEY => parts.cdata(scalar(tag, value)?),
            reserved if reserved.starts_with('$') => {
                return Err(SerializeError::InvalidShape {
                    reason: format!("unknown key '{reserved}' under '{tag}'"),
                })
            }
            _ => {
                let child = if value.is_list() {
                    let items: Vec<Term<'_>> =
                        value.decode().map_err(|_| invalid(&key, "improper list"))?;
                    let nodes = items
                        .into_iter()
                        .map(|item| {
                            if item.is_list() {
                                Err(invalid(&key, "nested list"))
                            } else {
                                node_from_term(&key, item, depth + 1)
                            }
                        })
                        .collect::<Result<_, _>>()?;
                    Child::Many(nodes)
                } else {
                    Child::One(node_from_term(&key, value, depth + 1)?)
                };
                parts.child(key, child);
            }
        }
    }
    parts.finish(tag)
}

/// Attribute map; `nil` values are dropped
fn attributes_from_term(tag: &str, term: Term<'_>) -> Result<Attributes, SerializeError> {
    let entries = MapIterator::new(term).ok_or_else(|| invalid(tag, "attribute term"))?;
    let mut attributes = Attributes::new();
    for (name, value) in entries {
        if is_nil(value) {
            continue;
        }
        attributes.insert(key_to_string(tag, name)?, scalar(tag, value)?);
    }
    Ok(attributes)
}

fn scalar(tag: &str, term: Term<'_>) -> Result<String, SerializeError> {
    if !term.is_binary() {
        return Err(invalid(tag, "non-binary scalar"));
    }
    term.decode::<String>()
        .map_err(|_| invalid(tag, "non UTF-8 binary"))
}

/// Map keys may be binaries or atoms
fn key_to_string(tag: &str, term: Term<'_>) -> Result<String, SerializeError> {
    if term.is_atom() {
        return term.atom_to_string().map_err(|_| invalid(tag, "key"));
    }
    scalar(tag, term)
}

#[inline]
fn is_nil(term: Term<'_>) -> bool {
    term.decode::<rustler::Atom>()
        .is_ok_and(|a| a == atom::nil())
}

fn invalid(tag: &str, what: &str) -> SerializeError {
    SerializeError::InvalidShape {
        reason: format!("unexpected {what} under '{tag}'"),
    }
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: Term<'a>) -> Term<'a> {
    (atom::ok(), value).encode(env)
}

/// `{:error, {:parse_error, message, line, excerpt}}`
pub fn parse_error_to_term<'a>(env: Env<'a>, err: &ParseError) -> Term<'a> {
    let reason = (
        parse_error(),
        str_to_binary(env, &err.message),
        err.line,
        str_to_binary(env, &err.excerpt),
    );
    (atom::error(), reason).encode(env)
}

/// `{:error, {:serialize_error, message}}`
pub fn serialize_error_to_term<'a>(env: Env<'a>, err: &SerializeError) -> Term<'a> {
    let reason = (serialize_error(), str_to_binary(env, &err.to_string()));
    (atom::error(), reason).encode(env)
}

/// `{:error, {:namespace_error, message}}`
pub fn namespace_error_to_term<'a>(env: Env<'a>, err: &NamespaceError) -> Term<'a> {
    let reason = (namespace_error(), str_to_binary(env, &err.to_string()));
    (atom::error(), reason).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
