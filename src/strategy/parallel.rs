//! Parallel Batch Parsing
//!
//! Uses Rayon to parse independent documents across the thread pool.

use rayon::prelude::*;
use crate::core::parse_bytes;
use crate::dom::revive::{simplify as simplify_node, Reviver};
use crate::dom::Node;
use crate::error::ParseError;

/// Parse many documents in parallel, keeping input order
///
/// With `simplify` set every tree goes through the simplifying reviver.
pub fn parse_parallel(inputs: &[&[u8]], simplify: bool) -> Vec<Result<Node, ParseError>> {
    log::trace!("parsing {} documents in parallel", inputs.len());
    inputs
        .par_iter()
        .map(|input| {
            let reviver: Option<Reviver<'_>> = if simplify { Some(&simplify_node) } else { None };
            parse_bytes(input, reviver)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Child;

    #[test]
    fn test_parallel_parse_keeps_order() {
        let inputs: [&[u8]; 4] = [b"<a>1</a>", b"<b/>", b"<c", b"<d x=\"1\">2</d>"];
        let results = parse_parallel(&inputs, false);
        assert_eq!(results.len(), 4);

        assert_eq!(results[0], Ok(Node::document("a", Node::text("1"))));
        assert_eq!(results[1].as_ref().unwrap().as_document().unwrap().0, "b");
        assert!(results[2].is_err());
        assert_eq!(results[3].as_ref().unwrap().as_document().unwrap().0, "d");
    }

    #[test]
    fn test_parallel_parse_simplified() {
        let inputs: [&[u8]; 2] = [b"<a><b k=\"v\">1</b><c/></a>", b"<x xsi:nil=\"true\"/>"];
        let results = parse_parallel(&inputs, true);

        let a = results[0].as_ref().unwrap().as_document().unwrap().1;
        assert_eq!(a.get("b"), Some(&Child::One(Node::text("1"))));
        assert_eq!(a.get("c"), Some(&Child::One(Node::Null)));
        assert_eq!(results[1], Ok(Node::document("x", Node::Null)));
    }

    #[test]
    fn test_parallel_parse_empty_batch() {
        assert!(parse_parallel(&[], false).is_empty());
    }
}
