//! Evaluation Errors and Control Signals
//!
//! Errors are typed signals that propagate upward until the host boundary.
//! There is no in-language recovery construct, so the interpreter's job is
//! a precise diagnostic: kind, source position, and message.
//!
//! Control flow for break/continue/return travels as a `Signal` returned
//! by every statement; loops and function frames decide which signals to
//! consume. `next` crosses expression boundaries (it is a callable), so it
//! travels on the error channel instead and is consumed by the per-record
//! loop in the driver.

use thiserror::Error;

use crate::ast::types::Position;
use crate::interpreter::value::Value;

/// All interpreter errors, each carrying the position of the node that
/// raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Wrong shape of program: break outside a loop, call to an undefined
    /// function, a regex literal in a value position, and similar.
    #[error("program error at {pos}: {message}")]
    Program { pos: Position, message: String },

    /// Scalar/array clash or arithmetic on a non-numeric value.
    #[error("type error at {pos}: {message}")]
    Type { pos: Position, message: String },

    /// Field or array index out of range or missing.
    #[error("index error at {pos}: {message}")]
    Index { pos: Position, message: String },

    /// Bad built-in arity or no matching overload.
    #[error("argument error at {pos}: {message}")]
    Argument { pos: Position, message: String },

    /// `next` in flight. Not a diagnostic: the per-record loop consumes it
    /// and moves on. It only surfaces as an error when raised outside a
    /// main rule.
    #[error("next is not allowed outside a main rule (at {pos})")]
    NextRecord { pos: Position },
}

impl EvalError {
    pub fn program(pos: Position, message: impl Into<String>) -> Self {
        Self::Program { pos, message: message.into() }
    }

    pub fn type_error(pos: Position, message: impl Into<String>) -> Self {
        Self::Type { pos, message: message.into() }
    }

    pub fn index(pos: Position, message: impl Into<String>) -> Self {
        Self::Index { pos, message: message.into() }
    }

    pub fn argument(pos: Position, message: impl Into<String>) -> Self {
        Self::Argument { pos, message: message.into() }
    }

    /// The source position the error was raised at.
    pub fn pos(&self) -> Position {
        match self {
            EvalError::Program { pos, .. }
            | EvalError::Type { pos, .. }
            | EvalError::Index { pos, .. }
            | EvalError::Argument { pos, .. }
            | EvalError::NextRecord { pos } => *pos,
        }
    }
}

/// Outcome of evaluating a statement. Loops consume `Break`/`Continue`,
/// function frames consume `Return`. Any signal reaching a rule boundary
/// unconsumed is a program error.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Normal completion, with the statement's value if it had one.
    Normal(Option<Value>),
    Break(Position),
    Continue(Position),
    Return(Position, Option<Value>),
}

impl Signal {
    pub fn is_normal(&self) -> bool {
        matches!(self, Signal::Normal(_))
    }
}
