//! Parsing Strategy Module
//!
//! Single documents go through [`crate::core::parse`]; batches of
//! independent documents fan out over the Rayon pool here.

pub mod parallel;

pub use parallel::parse_parallel;
