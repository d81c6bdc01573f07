//! DOM Module - Natural Tree
//!
//! The tree the parser produces and every other pass consumes:
//! - `node`: the closed node enum and its child/attribute maps
//! - `builder`: arena of open frames turning parse events into nodes
//! - `revive`: bottom-up reviver pipeline and the simplifying reviver
//! - `namespace`: scoped prefix resolution and tree normalization

pub mod builder;
pub mod namespace;
pub mod node;
pub mod revive;

pub use namespace::{normalize_namespaces, NamespaceResolver};
pub use node::{Attributes, Child, Children, Content, Element, Node};
pub use revive::{revive, simplify, Reviver};
