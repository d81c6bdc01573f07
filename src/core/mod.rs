//! Core markup primitives
//!
//! This module contains the building blocks of the text side:
//! - Chars: static classification tables and the predefined entities
//! - Scanner: memchr-accelerated forward cursor with line/excerpt reporting
//! - Entities: entity decoding (`clean`) and output escaping
//! - Parser: recursive scanner driving the tree builder

pub mod chars;
pub mod entities;
pub mod parser;
pub mod scanner;

pub use parser::{parse, parse_bytes};
