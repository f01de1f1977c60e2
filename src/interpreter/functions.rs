//! User Function Dispatch
//!
//! A call binds each declared parameter positionally in a fresh local
//! frame, collects surplus arguments into a local array named after the
//! function, runs the body, and consumes the `Return` signal. Callers
//! must supply at least as many arguments as there are declared
//! parameters.

use std::collections::HashMap;

use crate::ast::types::{Expr, FunctionDef, Position};
use crate::interpreter::errors::{EvalError, Signal};
use crate::interpreter::expressions::eval_expr;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::statements::exec_block;
use crate::interpreter::value::{ArrayMap, Value};

/// Maximum call nesting before recursion is cut off.
pub const MAX_CALL_DEPTH: usize = 200;

/// Call a user-defined function and produce its return value (the empty
/// scalar when the body falls off the end).
pub fn call_function(
    interp: &mut Interpreter,
    def: &FunctionDef,
    args: &[Expr],
    pos: Position,
) -> Result<Value, EvalError> {
    if args.len() < def.params.len() {
        return Err(EvalError::argument(
            pos,
            format!(
                "function '{}' expects at least {} argument(s), got {}",
                def.name,
                def.params.len(),
                args.len()
            ),
        ));
    }
    if interp.call_depth >= MAX_CALL_DEPTH {
        return Err(EvalError::program(
            pos,
            format!("recursion limit ({}) exceeded in '{}'", MAX_CALL_DEPTH, def.name),
        ));
    }

    // Arguments are evaluated in the caller's scope, before the new
    // frame exists.
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval_expr(interp, arg)?);
    }

    let mut frame = HashMap::new();
    let mut rest = values.split_off(def.params.len());
    for (param, value) in def.params.iter().zip(values) {
        frame.insert(param.clone(), value);
    }
    if !rest.is_empty() {
        let mut surplus = ArrayMap::new();
        for (i, value) in rest.drain(..).enumerate() {
            surplus.insert((i + 1).to_string(), value);
        }
        frame.insert(def.name.clone(), Value::Array(surplus));
    }

    interp.env.push_frame(frame);
    interp.call_depth += 1;
    let outcome = exec_block(interp, &def.body);
    interp.call_depth -= 1;
    interp.env.pop_frame();

    match outcome? {
        Signal::Return(_, value) => Ok(value.unwrap_or_else(Value::empty)),
        Signal::Normal(_) => Ok(Value::empty()),
        Signal::Break(break_pos) => Err(EvalError::program(break_pos, "break outside a loop")),
        Signal::Continue(continue_pos) => {
            Err(EvalError::program(continue_pos, "continue outside a loop"))
        }
    }
}
