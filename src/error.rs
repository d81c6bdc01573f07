//! Error types
//!
//! Every failure is fatal to the call that raised it:
//! - ParseError: malformed markup, shape violations, bad entities
//! - SerializeError: trees that have no markup form
//! - NamespaceError: prefixes that cannot be resolved

use thiserror::Error;

/// Markup rejected by the parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line} near {excerpt:?}")]
pub struct ParseError {
    /// Human-readable description
    pub message: String,
    /// 1-based line of the failure point
    pub line: usize,
    /// Short slice of input starting at the failure point
    pub excerpt: String,
}

/// Shape violations detected by the tree builder
///
/// The scanner attaches position information and reports these as
/// [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("element cannot hold both child elements and character data")]
    ChildAfterValue,
    #[error("element cannot hold both character data and child elements")]
    ValueAfterChildren,
    #[error("element cannot hold both CDATA and a text value")]
    CdataValueConflict,
    #[error("duplicate attribute '{0}'")]
    DuplicateAttribute(String),
    #[error("closing tag mismatch: expected '{expected}', found '{found}'")]
    ClosingTagMismatch { expected: String, found: String },
    #[error("closing tag without an open element")]
    UnexpectedClose,
    #[error("content outside of the root element")]
    OutsideRoot,
    #[error("more than one root element")]
    MultipleRoots,
    #[error("no root element")]
    NoRoot,
    #[error("unclosed element '{0}'")]
    Unclosed(String),
    #[error("maximum nesting depth exceeded ({0})")]
    TooDeep(usize),
}

/// Trees that cannot be turned into markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("document must be a mapping with exactly one root element")]
    NotADocument,
    #[error("element '{tag}' mixes a value or CDATA with child elements")]
    MixedContent { tag: String },
    #[error("invalid tree shape: {reason}")]
    InvalidShape { reason: String },
    #[error("maximum nesting depth exceeded ({limit})")]
    TooDeep { limit: usize },
}

/// Failures of the namespace normalization pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("prefix '{prefix}' of '{name}' is not bound to a namespace")]
    UnboundPrefix { prefix: String, name: String },
    #[error("attribute '{name}' appears twice after namespace resolution")]
    DuplicateAttribute { name: String },
    #[error("document must be a mapping with exactly one root element")]
    NotADocument,
}
