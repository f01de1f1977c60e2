//! Record I/O Built-ins
//!
//! print, printf, getline, and next. Output accumulates in the
//! interpreter's buffer; the host decides where the bytes go.

use crate::interpreter::builtins::format::{display_scalar, format_printf};
use crate::interpreter::builtins::BuiltinCall;
use crate::interpreter::errors::EvalError;
use crate::interpreter::expressions::to_scalar;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::value::Value;
use crate::interpreter::variables;

/// print a1, a2, ...: arguments joined by OFS and terminated by ORS.
/// With no arguments, prints the current record.
pub fn print(interp: &mut Interpreter, call: &BuiltinCall) -> Result<Value, EvalError> {
    let ofs = variables::current_ofs(interp);
    let ors = variables::current_ors(interp);
    let ofmt = variables::current_ofmt(interp);

    let line = if call.arg_count() == 0 {
        interp.records.record().to_string()
    } else {
        let mut parts = Vec::with_capacity(call.arg_count());
        for i in 1..=call.arg_count() {
            let scalar = to_scalar(call.positional(i).cloned().unwrap(), call.pos)?;
            parts.push(display_scalar(&scalar, &ofmt));
        }
        parts.join(&ofs)
    };

    interp.output.push_str(&line);
    interp.output.push_str(&ors);
    Ok(Value::empty())
}

/// printf fmt, args...: formatted output, no record separator appended.
pub fn printf(interp: &mut Interpreter, call: &BuiltinCall) -> Result<Value, EvalError> {
    if call.arg_count() == 0 {
        return Err(EvalError::argument(call.pos, "printf requires a format string"));
    }
    let fmt = to_scalar(call.positional(1).cloned().unwrap(), call.pos)?;
    let mut values = Vec::new();
    for i in 2..=call.arg_count() {
        values.push(to_scalar(call.positional(i).cloned().unwrap(), call.pos)?);
    }
    let formatted = format_printf(&fmt, &values);
    interp.output.push_str(&formatted);
    Ok(Value::empty())
}

/// getline: pull the next record, returning "1" on success and "0" at
/// the end of input. `getline var` stores the raw next line in the
/// variable without re-splitting the current record.
pub fn getline(interp: &mut Interpreter, call: &mut BuiltinCall) -> Result<Value, EvalError> {
    if call.has("varLine") {
        return Ok(match interp.records.next_raw() {
            Some(line) => {
                call.set("varLine", Value::scalar(line));
                Value::bool(true)
            }
            None => Value::bool(false),
        });
    }
    let fs = variables::current_fs(interp);
    Ok(Value::bool(interp.records.advance(&fs)))
}

/// next: abandon the current record. Travels on the error channel so it
/// can escape nested expressions and function frames; the driver's
/// per-record loop consumes it.
pub fn next_record(call: &BuiltinCall) -> Result<Value, EvalError> {
    Err(EvalError::NextRecord { pos: call.pos })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Expr, Position};
    use crate::interpreter::builtins::call_builtin;
    use std::collections::HashMap;

    fn make_interp() -> Interpreter {
        Interpreter::new(&HashMap::new())
    }

    fn pos() -> Position {
        Position::default()
    }

    #[test]
    fn test_print_joins_with_ofs() {
        let mut interp = make_interp();
        call_builtin(
            &mut interp,
            "print",
            &[Expr::constant("a"), Expr::constant("b")],
            pos(),
        )
        .unwrap();
        assert_eq!(interp.output, "a b\n");
    }

    #[test]
    fn test_print_no_args_prints_record() {
        let mut interp = make_interp();
        interp.records.split_and_assign("the record", " ");
        call_builtin(&mut interp, "print", &[], pos()).unwrap();
        assert_eq!(interp.output, "the record\n");
    }

    #[test]
    fn test_print_respects_ofs_and_ors() {
        let mut interp = make_interp();
        interp.env.set("OFS", Value::scalar("-"), pos()).unwrap();
        interp.env.set("ORS", Value::scalar(";"), pos()).unwrap();
        call_builtin(
            &mut interp,
            "print",
            &[Expr::constant("a"), Expr::constant("b")],
            pos(),
        )
        .unwrap();
        assert_eq!(interp.output, "a-b;");
    }

    #[test]
    fn test_print_formats_fractions_with_ofmt() {
        let mut interp = make_interp();
        call_builtin(&mut interp, "print", &[Expr::constant("3.14159265")], pos()).unwrap();
        assert_eq!(interp.output, "3.14159\n");
    }

    #[test]
    fn test_printf_formats_without_ors() {
        let mut interp = make_interp();
        call_builtin(
            &mut interp,
            "printf",
            &[Expr::constant("%s:%d"), Expr::constant("n"), Expr::number(3.0)],
            pos(),
        )
        .unwrap();
        assert_eq!(interp.output, "n:3");
    }

    #[test]
    fn test_printf_without_format_errors() {
        let mut interp = make_interp();
        let err = call_builtin(&mut interp, "printf", &[], pos()).unwrap_err();
        assert!(matches!(err, EvalError::Argument { .. }));
    }

    #[test]
    fn test_getline_advances_record() {
        let mut interp = make_interp();
        interp
            .records
            .open("data", vec!["one two".to_string(), "three".to_string()], " ");
        let ok = call_builtin(&mut interp, "getline", &[], pos()).unwrap();
        assert_eq!(ok, Value::scalar("1"));
        assert_eq!(interp.records.record(), "three");
        assert_eq!(interp.records.nr(), 2);
    }

    #[test]
    fn test_getline_at_eof_returns_zero() {
        let mut interp = make_interp();
        interp.records.open("data", vec!["only".to_string()], " ");
        let ok = call_builtin(&mut interp, "getline", &[], pos()).unwrap();
        assert_eq!(ok, Value::scalar("0"));
    }

    #[test]
    fn test_getline_var_does_not_resplit() {
        let mut interp = make_interp();
        interp
            .records
            .open("data", vec!["a b".to_string(), "raw line".to_string()], " ");
        let ok = call_builtin(
            &mut interp,
            "getline",
            &[Expr::variable("line")],
            pos(),
        )
        .unwrap();
        assert_eq!(ok, Value::scalar("1"));
        assert_eq!(interp.env.get("line"), Some(&Value::scalar("raw line")));
        // Current record and fields are untouched
        assert_eq!(interp.records.record(), "a b");
        assert_eq!(interp.records.nf(), 2);
        // The raw read still counts records
        assert_eq!(interp.records.nr(), 2);
    }

    #[test]
    fn test_next_travels_as_signal() {
        let mut interp = make_interp();
        let err = call_builtin(&mut interp, "next", &[], pos()).unwrap_err();
        assert!(matches!(err, EvalError::NextRecord { .. }));
    }
}
