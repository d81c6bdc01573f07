//! Natural-shape bridge for serde
//!
//! A node serializes to the shape a JSON consumer expects: text becomes a
//! string, the null marker becomes null, an element becomes an object whose
//! `$`, `$value` and `$cdata` keys hold attributes and content and whose
//! other keys hold children (arrays for repeated tags).
//!
//! The reverse direction goes through [`ElementParts`], which rejects objects
//! that have no markup form. Unknown `$` keys and nesting beyond
//! [`MAX_DEPTH`] are rejected as well.

use crate::dom::node::{
    Attributes, Child, Content, Element, ElementParts, Node, ATTRIBUTES_KEY, CDATA_KEY, MAX_DEPTH,
    VALUE_KEY,
};
use crate::error::SerializeError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Text(text) => serializer.serialize_str(text),
            Node::Element(Element { attributes, content }) => {
                let entries = match content {
                    Content::Children(children) => children.len(),
                    Content::Value(_) | Content::Cdata(_) => 1,
                };
                let len = entries + usize::from(attributes.is_some());

                let mut map = serializer.serialize_map(Some(len))?;
                if let Some(attributes) = attributes {
                    map.serialize_entry(ATTRIBUTES_KEY, attributes)?;
                }
                match content {
                    Content::Value(text) => map.serialize_entry(VALUE_KEY, text)?,
                    Content::Cdata(text) => map.serialize_entry(CDATA_KEY, text)?,
                    Content::Children(children) => {
                        for (name, child) in children {
                            map.serialize_entry(name, child)?;
                        }
                    }
                }
                map.end()
            }
        }
    }
}

impl Serialize for Child {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Child::One(node) => node.serialize(serializer),
            Child::Many(nodes) => serializer.collect_seq(nodes),
        }
    }
}

impl TryFrom<Value> for Node {
    type Error = SerializeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        node_from_value("", value, 0)
    }
}

/// `depth` counts enclosing elements; the document mapping sits at 0
fn node_from_value(tag: &str, value: Value, depth: usize) -> Result<Node, SerializeError> {
    match value {
        Value::Null => Ok(Node::Null),
        Value::String(text) => Ok(Node::Text(text)),
        Value::Object(_) if depth > MAX_DEPTH => Err(SerializeError::TooDeep { limit: MAX_DEPTH }),
        Value::Object(map) => element_from_map(tag, map, depth),
        other => Err(invalid(tag, &other)),
    }
}

fn element_from_map(
    tag: &str,
    map: Map<String, Value>,
    depth: usize,
) -> Result<Node, SerializeError> {
    let mut parts = ElementParts::new();
    for (key, value) in map {
        match key.as_str() {
            ATTRIBUTES_KEY => match value {
                Value::Null => {}
                Value::Object(attrs) => parts.attributes(attributes_from_map(tag, attrs)?),
                other => return Err(invalid(tag, &other)),
            },
            VALUE_KEY => parts.value(scalar(tag, value)?),
            CDATA_KEY => parts.cdata(scalar(tag, value)?),
            reserved if reserved.starts_with('$') => {
                return Err(SerializeError::InvalidShape {
                    reason: format!("unknown key '{reserved}' under '{tag}'"),
                })
            }
            _ => {
                let child = match value {
                    Value::Array(items) => Child::Many(
                        items
                            .into_iter()
                            .map(|item| match item {
                                Value::Array(_) => Err(invalid(&key, &item)),
                                item => node_from_value(&key, item, depth + 1),
                            })
                            .collect::<Result<_, _>>()?,
                    ),
                    value => Child::One(node_from_value(&key, value, depth + 1)?),
                };
                parts.child(key, child);
            }
        }
    }
    parts.finish(tag)
}

/// Attribute object; null values are dropped
fn attributes_from_map(tag: &str, map: Map<String, Value>) -> Result<Attributes, SerializeError> {
    let mut attributes = Attributes::with_capacity(map.len());
    for (name, value) in map {
        match value {
            Value::Null => {}
            Value::String(text) => {
                attributes.insert(name, text);
            }
            other => return Err(invalid(tag, &other)),
        }
    }
    Ok(attributes)
}

fn scalar(tag: &str, value: Value) -> Result<String, SerializeError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(invalid(tag, &other)),
    }
}

fn invalid(tag: &str, value: &Value) -> SerializeError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SerializeError::InvalidShape {
        reason: format!("unexpected {kind} under '{tag}'"),
    }
}
