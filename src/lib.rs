//! NaturalXML - XML to natural tree conversion
//!
//! Markup becomes a tree of strings, maps and sequences the way a JSON
//! consumer would model it, and goes back again:
//! - `parse`: markup to tree, with an optional per-node reviver
//! - `stringify`: tree to markup, compact or indented
//! - `normalize_namespaces`: rewrite names into `uri|local` form
//! - `parse_parallel`: batch parsing over Rayon
//!
//! The crate is also an Erlang NIF library (`Elixir.NaturalXML.Native`)
//! exchanging trees as maps, binaries and lists.

use rustler::{Binary, Env, NifResult, Term};

pub mod core;
pub mod dom;
pub mod error;
pub mod json;
pub mod strategy;
pub mod term;
pub mod writer;

pub use crate::core::{parse, parse_bytes};
pub use crate::dom::{
    normalize_namespaces, revive, simplify, Attributes, Child, Children, Content, Element, Node,
    Reviver,
};
pub use crate::error::{BuilderError, NamespaceError, ParseError, SerializeError};
pub use crate::strategy::parse_parallel;
pub use crate::writer::{stringify, StringifyOptions};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Parsing
// ============================================================================

fn reviver_for(simplify: bool) -> Option<Reviver<'static>> {
    if simplify {
        Some(&dom::simplify)
    } else {
        None
    }
}

fn tree_result<'a>(env: Env<'a>, result: Result<Node, ParseError>) -> NifResult<Term<'a>> {
    match result {
        Ok(tree) => Ok(term::ok_tuple(env, term::node_to_term(env, &tree)?)),
        Err(err) => Ok(term::parse_error_to_term(env, &err)),
    }
}

/// Parse a document (returns {:ok, tree} or {:error, {:parse_error, msg, line, excerpt}})
#[rustler::nif(name = "parse")]
fn parse_nif<'a>(env: Env<'a>, input: Binary<'a>, simplify: bool) -> NifResult<Term<'a>> {
    tree_result(env, parse_bytes(input.as_slice(), reviver_for(simplify)))
}

/// Parse a batch of documents in parallel, one result tuple per input
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_many<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>, simplify: bool) -> NifResult<Term<'a>> {
    let slices: Vec<&[u8]> = inputs.iter().map(|input| input.as_slice()).collect();
    let results = parse_parallel(&slices, simplify);

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        list = list.list_prepend(tree_result(env, result)?);
    }
    Ok(list)
}

// ============================================================================
// Tree Transforms
// ============================================================================

/// Apply the simplifying reviver to a tree
#[rustler::nif(name = "simplify")]
fn simplify_nif<'a>(env: Env<'a>, tree: Term<'a>) -> NifResult<Term<'a>> {
    match term::term_to_node(tree) {
        Ok(node) => {
            let simplified = revive(node, reviver_for(true));
            Ok(term::ok_tuple(env, term::node_to_term(env, &simplified)?))
        }
        Err(err) => Ok(term::serialize_error_to_term(env, &err)),
    }
}

/// Rewrite element and attribute names into `uri|local` form
#[rustler::nif(name = "normalize_namespaces")]
fn normalize_namespaces_nif<'a>(env: Env<'a>, tree: Term<'a>) -> NifResult<Term<'a>> {
    let node = match term::term_to_node(tree) {
        Ok(node) => node,
        Err(err) => return Ok(term::serialize_error_to_term(env, &err)),
    };
    match normalize_namespaces(node) {
        Ok(normalized) => Ok(term::ok_tuple(env, term::node_to_term(env, &normalized)?)),
        Err(err) => Ok(term::namespace_error_to_term(env, &err)),
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize a tree to markup, indented when `indent` is a binary
#[rustler::nif(name = "stringify")]
fn stringify_nif<'a>(env: Env<'a>, tree: Term<'a>, indent: Option<String>) -> NifResult<Term<'a>> {
    let options = StringifyOptions { indent };
    let markup = term::term_to_node(tree).and_then(|node| stringify(&node, &options));
    match markup {
        Ok(markup) => Ok(term::ok_tuple(env, term::str_to_binary(env, &markup))),
        Err(err) => Ok(term::serialize_error_to_term(env, &err)),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.NaturalXML.Native");
