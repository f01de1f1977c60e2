//! Math Built-ins
//!
//! Scalar numeric functions. Operands go through the lenient numeric
//! coercion, so `int("3x")` is 3 and `sqrt("")` is 0.

use crate::interpreter::builtins::BuiltinCall;
use crate::interpreter::errors::EvalError;
use crate::interpreter::value::{to_number, Value};

/// Apply a single-result math built-in.
pub fn apply(name: &str, call: &BuiltinCall) -> Result<Value, EvalError> {
    let n = match name {
        "atan2" => {
            let y = to_number(&call.scalar("y")?);
            let x = to_number(&call.scalar("x")?);
            y.atan2(x)
        }
        _ => {
            let x = to_number(&call.scalar("x")?);
            match name {
                "int" => x.trunc(),
                "sqrt" => x.sqrt(),
                "exp" => x.exp(),
                "log" => x.ln(),
                "sin" => x.sin(),
                "cos" => x.cos(),
                _ => {
                    return Err(EvalError::program(
                        call.pos,
                        format!("unknown math built-in '{}'", name),
                    ));
                }
            }
        }
    };
    Ok(Value::number(n))
}
