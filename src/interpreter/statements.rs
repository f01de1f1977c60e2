//! Statement Execution
//!
//! Every statement evaluates to a `Signal`. Loops consume `Break` and
//! `Continue`; function frames consume `Return`; everything else
//! propagates until the driver reports an unconsumed signal as a
//! program error.

use crate::ast::types::{Expr, Position, Stmt, StmtKind};
use crate::interpreter::errors::{EvalError, Signal};
use crate::interpreter::expressions::{eval_bool, eval_expr, eval_key};
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::value::Value;
use crate::interpreter::variables;

/// Execute a statement list, stopping at the first non-normal signal.
pub fn exec_block(interp: &mut Interpreter, stmts: &[Stmt]) -> Result<Signal, EvalError> {
    for stmt in stmts {
        let signal = exec_stmt(interp, stmt)?;
        if !signal.is_normal() {
            return Ok(signal);
        }
    }
    Ok(Signal::Normal(None))
}

/// Execute a single statement.
pub fn exec_stmt(interp: &mut Interpreter, stmt: &Stmt) -> Result<Signal, EvalError> {
    match &stmt.kind {
        StmtKind::Expr(expr) => {
            let value = eval_expr(interp, expr)?;
            Ok(Signal::Normal(Some(value)))
        }

        StmtKind::Block(stmts) => exec_block(interp, stmts),

        StmtKind::If { condition, consequent, alternate } => {
            if eval_bool(interp, condition)? {
                exec_stmt(interp, consequent)
            } else if let Some(alt) = alternate {
                exec_stmt(interp, alt)
            } else {
                Ok(Signal::Normal(None))
            }
        }

        StmtKind::While { condition, body } => {
            while eval_bool(interp, condition)? {
                match exec_stmt(interp, body)? {
                    Signal::Break(_) => break,
                    Signal::Continue(_) | Signal::Normal(_) => {}
                    ret @ Signal::Return(..) => return Ok(ret),
                }
            }
            Ok(Signal::Normal(None))
        }

        StmtKind::DoWhile { body, condition } => {
            loop {
                match exec_stmt(interp, body)? {
                    Signal::Break(_) => break,
                    Signal::Continue(_) | Signal::Normal(_) => {}
                    ret @ Signal::Return(..) => return Ok(ret),
                }
                if !eval_bool(interp, condition)? {
                    break;
                }
            }
            Ok(Signal::Normal(None))
        }

        StmtKind::For { init, condition, update, body } => {
            if let Some(init) = init {
                let signal = exec_stmt(interp, init)?;
                if !signal.is_normal() {
                    return Ok(signal);
                }
            }
            loop {
                if let Some(condition) = condition {
                    if !eval_bool(interp, condition)? {
                        break;
                    }
                }
                match exec_stmt(interp, body)? {
                    Signal::Break(_) => break,
                    // The update step runs after normal and continued iterations
                    Signal::Continue(_) | Signal::Normal(_) => {}
                    ret @ Signal::Return(..) => return Ok(ret),
                }
                if let Some(update) = update {
                    let signal = exec_stmt(interp, update)?;
                    if !signal.is_normal() {
                        return Ok(signal);
                    }
                }
            }
            Ok(Signal::Normal(None))
        }

        StmtKind::ForIn { variable, array, body } => {
            exec_for_in(interp, variable, array, body, stmt.pos)
        }

        StmtKind::Break => Ok(Signal::Break(stmt.pos)),
        StmtKind::Continue => Ok(Signal::Continue(stmt.pos)),

        StmtKind::Return(value) => {
            let value = match value {
                Some(expr) => Some(eval_expr(interp, expr)?),
                None => None,
            };
            Ok(Signal::Return(stmt.pos, value))
        }

        StmtKind::Delete { array, indices } => {
            exec_delete(interp, array, indices, stmt.pos)?;
            Ok(Signal::Normal(None))
        }
    }
}

/// Iterate over an array's keys in storage order. The key list is
/// snapshotted first, so the body may mutate the array freely. An
/// unbound name iterates zero times.
fn exec_for_in(
    interp: &mut Interpreter,
    variable: &str,
    array: &str,
    body: &Stmt,
    pos: Position,
) -> Result<Signal, EvalError> {
    let keys: Vec<String> = match interp.env.get(array) {
        None => Vec::new(),
        Some(Value::Scalar(_)) => {
            return Err(EvalError::type_error(
                pos,
                format!("cannot use scalar '{}' as an array", array),
            ));
        }
        Some(Value::Array(map)) => map.keys().cloned().collect(),
    };

    for key in keys {
        variables::set_variable(interp, variable, Value::scalar(key), pos)?;
        match exec_stmt(interp, body)? {
            Signal::Break(_) => break,
            Signal::Continue(_) | Signal::Normal(_) => {}
            ret @ Signal::Return(..) => return Ok(ret),
        }
    }
    Ok(Signal::Normal(None))
}

/// `delete a[i, ...]` removes one element (a missing index at any level
/// is an index error); `delete a` clears the whole array.
fn exec_delete(
    interp: &mut Interpreter,
    array: &str,
    indices: &[Expr],
    pos: Position,
) -> Result<(), EvalError> {
    if indices.is_empty() {
        interp.env.ensure_array(array, pos)?;
        if let Some(Value::Array(map)) = interp.env.get_mut(array) {
            map.clear();
        }
        return Ok(());
    }

    let mut keys = Vec::with_capacity(indices.len());
    for index in indices {
        keys.push(eval_key(interp, index)?);
    }

    let mut node = interp.env.ensure_array(array, pos)?;
    let (last, inner) = keys.split_last().unwrap();
    for key in inner {
        let map = match node {
            Value::Array(map) => map,
            Value::Scalar(_) => unreachable!("chain nodes are arrays"),
        };
        node = match map.get_mut(key) {
            Some(entry @ Value::Array(_)) => entry,
            _ => {
                return Err(EvalError::index(
                    pos,
                    format!("no element '{}' in array '{}'", key, array),
                ));
            }
        };
    }
    let map = match node {
        Value::Array(map) => map,
        Value::Scalar(_) => unreachable!("chain nodes are arrays"),
    };
    if map.shift_remove(last).is_none() {
        return Err(EvalError::index(
            pos,
            format!("no element '{}' in array '{}'", last, array),
        ));
    }
    Ok(())
}
