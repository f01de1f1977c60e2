//! just-awk - a tree-walking interpreter core for an AWK-family
//! text-processing language
//!
//! The host supplies an already-parsed program (see [`ast::types`]) and
//! input lines; the interpreter executes per-record pattern/action rules
//! and accumulates their output. The lexer/parser, file discovery, and
//! the concrete output sink live outside this crate.

pub mod ast;
pub mod interpreter;

pub use ast::types::*;
pub use interpreter::{ArrayMap, EvalError, InputFile, Interpreter, Signal, Value};
