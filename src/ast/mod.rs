//! AST module
//!
//! Syntax tree node types produced by the host parser.

pub mod types;

pub use types::*;
