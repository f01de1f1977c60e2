//! Built-in Function Library
//!
//! Each built-in declares one or more parameter sets (overloads).
//! Binding walks the candidates in declared order and picks the first
//! whose shape fits the call site: a parameter whose name starts with
//! `var` requires a variable reference argument and is passed by
//! reference (its value is copied back to the caller's binding on
//! return), and a parameter whose name starts with `regex` additionally
//! accepts a bare regex literal. Variadic built-ins take any argument
//! count, keyed `"1".."N"`.

pub mod format;
pub mod math;
pub mod record_io;
pub mod strings;

use std::collections::HashMap;

use crate::ast::types::{Expr, ExprKind, Position};
use crate::interpreter::errors::EvalError;
use crate::interpreter::expressions::eval_expr;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::value::Value;
use crate::interpreter::variables;

/// A built-in's name and acceptable parameter sets.
struct BuiltinDef {
    name: &'static str,
    overloads: &'static [&'static [&'static str]],
    variadic: bool,
}

const BUILTINS: &[BuiltinDef] = &[
    BuiltinDef { name: "print", overloads: &[], variadic: true },
    BuiltinDef { name: "printf", overloads: &[], variadic: true },
    BuiltinDef { name: "sprintf", overloads: &[], variadic: true },
    BuiltinDef { name: "next", overloads: &[], variadic: true },
    BuiltinDef {
        name: "getline",
        overloads: &[&[], &["varLine"]],
        variadic: false,
    },
    BuiltinDef {
        name: "sub",
        overloads: &[&["regex", "replacement"], &["regex", "replacement", "varTarget"]],
        variadic: false,
    },
    BuiltinDef {
        name: "gsub",
        overloads: &[&["regex", "replacement"], &["regex", "replacement", "varTarget"]],
        variadic: false,
    },
    BuiltinDef {
        name: "match",
        overloads: &[&["target", "regex"], &["target", "regex", "varGroups"]],
        variadic: false,
    },
    BuiltinDef {
        name: "split",
        overloads: &[&["string", "varParts"], &["string", "varParts", "regexSep"]],
        variadic: false,
    },
    BuiltinDef {
        name: "length",
        overloads: &[&["varItem"], &["item"], &[]],
        variadic: false,
    },
    BuiltinDef {
        name: "index",
        overloads: &[&["haystack", "needle"]],
        variadic: false,
    },
    BuiltinDef {
        name: "substr",
        overloads: &[&["string", "start"], &["string", "start", "count"]],
        variadic: false,
    },
    BuiltinDef { name: "tolower", overloads: &[&["string"]], variadic: false },
    BuiltinDef { name: "toupper", overloads: &[&["string"]], variadic: false },
    BuiltinDef { name: "int", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "sqrt", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "exp", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "log", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "sin", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "cos", overloads: &[&["x"]], variadic: false },
    BuiltinDef { name: "atan2", overloads: &[&["y", "x"]], variadic: false },
];

/// Whether a name refers to a built-in.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|def| def.name == name)
}

/// A bound call: parameter values plus the by-reference associations to
/// copy back when the native implementation returns.
pub struct BuiltinCall {
    pub pos: Position,
    values: HashMap<String, Value>,
    writebacks: Vec<(String, String)>,
    arg_count: usize,
}

impl BuiltinCall {
    fn new(pos: Position) -> Self {
        Self { pos, values: HashMap::new(), writebacks: Vec::new(), arg_count: 0 }
    }

    /// Argument count of a variadic call.
    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    pub fn has(&self, param: &str) -> bool {
        self.values.contains_key(param)
    }

    pub fn value(&self, param: &str) -> Option<&Value> {
        self.values.get(param)
    }

    /// A parameter in scalar context.
    pub fn scalar(&self, param: &str) -> Result<String, EvalError> {
        match self.values.get(param) {
            Some(Value::Scalar(s)) => Ok(s.clone()),
            Some(Value::Array(_)) => {
                Err(EvalError::type_error(self.pos, "array used in scalar context"))
            }
            None => Err(EvalError::argument(
                self.pos,
                format!("missing argument '{}'", param),
            )),
        }
    }

    /// A positional argument of a variadic call, 1-based.
    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.values.get(&index.to_string())
    }

    pub fn set(&mut self, param: &str, value: Value) {
        self.values.insert(param.to_string(), value);
    }
}

/// Dispatch a built-in call: bind arguments against the overload set,
/// run the native implementation, and copy mutated by-reference
/// parameters back to the caller's bindings.
pub fn call_builtin(
    interp: &mut Interpreter,
    name: &str,
    args: &[Expr],
    pos: Position,
) -> Result<Value, EvalError> {
    let def = BUILTINS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| EvalError::program(pos, format!("unknown built-in '{}'", name)))?;

    let mut call = if def.variadic {
        bind_variadic(interp, args, pos)?
    } else {
        bind_overload(interp, def, args, pos)?
    };

    let result = dispatch(interp, def.name, &mut call)?;

    let writebacks = std::mem::take(&mut call.writebacks);
    for (param, caller_name) in writebacks {
        if let Some(value) = call.values.get(&param).cloned() {
            variables::set_variable(interp, &caller_name, value, pos)?;
        }
    }

    Ok(result)
}

/// Whether a candidate parameter list fits the call shape. This is
/// purely structural so that argument side effects run exactly once,
/// after a candidate has been chosen.
fn candidate_fits(params: &[&str], args: &[Expr]) -> bool {
    if params.len() != args.len() {
        return false;
    }
    params.iter().zip(args).all(|(param, arg)| {
        if param.starts_with("var") {
            return matches!(arg.kind, ExprKind::Variable(_));
        }
        if matches!(arg.kind, ExprKind::Regex(_)) {
            return param.starts_with("regex");
        }
        true
    })
}

fn bind_overload(
    interp: &mut Interpreter,
    def: &BuiltinDef,
    args: &[Expr],
    pos: Position,
) -> Result<BuiltinCall, EvalError> {
    let params = def
        .overloads
        .iter()
        .copied()
        .find(|params| candidate_fits(params, args))
        .ok_or_else(|| {
            EvalError::argument(
                pos,
                format!("no overload of '{}' takes these {} argument(s)", def.name, args.len()),
            )
        })?;

    let mut call = BuiltinCall::new(pos);
    call.arg_count = args.len();
    for (param, arg) in params.iter().zip(args) {
        if param.starts_with("var") {
            let caller_name = match &arg.kind {
                ExprKind::Variable(name) => name.clone(),
                _ => unreachable!("candidate_fits checked the shape"),
            };
            // An unbound by-reference argument binds as the empty scalar
            let value = variables::get_variable(interp, &caller_name);
            call.values.insert(param.to_string(), value);
            call.writebacks.push((param.to_string(), caller_name));
        } else if let ExprKind::Regex(pattern) = &arg.kind {
            call.values.insert(param.to_string(), Value::scalar(pattern.clone()));
        } else {
            let value = eval_expr(interp, arg)?;
            call.values.insert(param.to_string(), value);
        }
    }
    Ok(call)
}

fn bind_variadic(
    interp: &mut Interpreter,
    args: &[Expr],
    pos: Position,
) -> Result<BuiltinCall, EvalError> {
    let mut call = BuiltinCall::new(pos);
    call.arg_count = args.len();
    for (i, arg) in args.iter().enumerate() {
        let value = eval_expr(interp, arg)?;
        call.values.insert((i + 1).to_string(), value);
    }
    Ok(call)
}

fn dispatch(
    interp: &mut Interpreter,
    name: &str,
    call: &mut BuiltinCall,
) -> Result<Value, EvalError> {
    match name {
        "print" => record_io::print(interp, call),
        "printf" => record_io::printf(interp, call),
        "sprintf" => strings::sprintf(call),
        "next" => record_io::next_record(call),
        "getline" => record_io::getline(interp, call),
        "sub" => strings::substitute(interp, call, false),
        "gsub" => strings::substitute(interp, call, true),
        "match" => strings::find_match(interp, call),
        "split" => strings::split(interp, call),
        "length" => strings::length(interp, call),
        "index" => strings::index_of(call),
        "substr" => strings::substr(call),
        "tolower" => strings::tolower(call),
        "toupper" => strings::toupper(call),
        "int" | "sqrt" | "exp" | "log" | "sin" | "cos" | "atan2" => math::apply(name, call),
        _ => Err(EvalError::program(call.pos, format!("unknown built-in '{}'", name))),
    }
}
