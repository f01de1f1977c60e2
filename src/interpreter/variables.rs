//! Well-Known Variable Dispatch
//!
//! `NR`, `FNR`, `NF`, and `FILENAME` live on the record manager and are
//! resolved by name through it; assignments to them have side effects
//! (assigning `NF` reshapes the field list). Every other name is an
//! ordinary environment binding, including `FS`, `OFS`, `ORS`, and
//! `OFMT`, which are seeded at startup.

use crate::ast::types::Position;
use crate::interpreter::errors::EvalError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::value::{to_number, Value};

/// Read a variable. Unbound names yield the empty scalar.
pub fn get_variable(interp: &Interpreter, name: &str) -> Value {
    match name {
        "NR" => Value::number(interp.records.nr() as f64),
        "FNR" => Value::number(interp.records.fnr() as f64),
        "NF" => Value::number(interp.records.nf() as f64),
        "FILENAME" => Value::scalar(interp.records.filename()),
        _ => interp.env.get(name).cloned().unwrap_or_else(Value::empty),
    }
}

/// Write a variable, dispatching record-state names to the manager.
pub fn set_variable(
    interp: &mut Interpreter,
    name: &str,
    value: Value,
    pos: Position,
) -> Result<(), EvalError> {
    match name {
        "NR" | "FNR" | "NF" | "FILENAME" => {
            let scalar = match value {
                Value::Scalar(s) => s,
                Value::Array(_) => {
                    return Err(EvalError::type_error(
                        pos,
                        format!("cannot use array '{}' as a scalar", name),
                    ));
                }
            };
            match name {
                "NR" => interp.records.set_nr(to_number(&scalar).max(0.0) as usize),
                "FNR" => interp.records.set_fnr(to_number(&scalar).max(0.0) as usize),
                "NF" => {
                    let nf = to_number(&scalar).max(0.0) as usize;
                    let ofs = current_ofs(interp);
                    interp.records.set_nf(nf, &ofs);
                }
                _ => interp.records.set_filename(&scalar),
            }
            Ok(())
        }
        _ => interp.env.set(name, value, pos),
    }
}

fn global_string(interp: &Interpreter, name: &str, default: &str) -> String {
    match interp.env.get(name) {
        Some(Value::Scalar(s)) => s.clone(),
        _ => default.to_string(),
    }
}

/// The current field separator.
pub fn current_fs(interp: &Interpreter) -> String {
    global_string(interp, "FS", " ")
}

/// The current output field separator.
pub fn current_ofs(interp: &Interpreter) -> String {
    global_string(interp, "OFS", " ")
}

/// The current output record separator.
pub fn current_ors(interp: &Interpreter) -> String {
    global_string(interp, "ORS", "\n")
}

/// The current numeric output format.
pub fn current_ofmt(interp: &Interpreter) -> String {
    global_string(interp, "OFMT", "%.6g")
}
