//! Expression Evaluation
//!
//! Dispatches on expression node kind and returns a `Value` or a typed
//! error. Arithmetic demands fully numeric operands; comparisons are
//! numeric when both sides parse cleanly and lexicographic otherwise;
//! `~` matches when the pattern occurs anywhere in the subject.

use regex_lite::Regex;

use crate::ast::types::{AssignOp, BinaryOp, Expr, ExprKind, Position, UnaryOp};
use crate::interpreter::errors::EvalError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::value::{
    array_key, compare_scalars, is_truthy, parse_strict, to_number, Value,
};
use crate::interpreter::{builtins, functions, variables};

/// Evaluate an expression to a value.
pub fn eval_expr(interp: &mut Interpreter, expr: &Expr) -> Result<Value, EvalError> {
    match &expr.kind {
        ExprKind::Constant(text) => Ok(Value::scalar(text.clone())),

        ExprKind::Regex(_) => Err(EvalError::program(
            expr.pos,
            "regex literal is only valid as a rule predicate or regex argument",
        )),

        ExprKind::Variable(name) => Ok(variables::get_variable(interp, name)),

        ExprKind::FieldRef(index) => {
            let idx = eval_field_index(interp, index)?;
            interp.records.get_field(idx, expr.pos).map(Value::scalar)
        }

        ExprKind::ArrayRef { name, indices } => {
            let keys = eval_keys(interp, indices)?;
            read_array_element(interp, name, &keys, expr.pos)
        }

        ExprKind::Binary { op, left, right } => eval_binary(interp, *op, left, right, expr.pos),

        ExprKind::Unary { op, operand } => eval_unary(interp, *op, operand, expr.pos),

        ExprKind::PreIncrement(target) => eval_step(interp, target, 1.0, StepOrder::Pre, expr.pos),
        ExprKind::PreDecrement(target) => eval_step(interp, target, -1.0, StepOrder::Pre, expr.pos),
        ExprKind::PostIncrement(target) => {
            eval_step(interp, target, 1.0, StepOrder::Post, expr.pos)
        }
        ExprKind::PostDecrement(target) => {
            eval_step(interp, target, -1.0, StepOrder::Post, expr.pos)
        }

        ExprKind::Ternary { condition, consequent, alternate } => {
            if eval_bool(interp, condition)? {
                eval_expr(interp, consequent)
            } else {
                eval_expr(interp, alternate)
            }
        }

        ExprKind::Assignment { op, target, value } => {
            eval_assignment(interp, *op, target, value, expr.pos)
        }

        ExprKind::In { keys, array } => {
            let key_strings = eval_keys(interp, keys)?;
            eval_membership(interp, &key_strings, array, expr.pos).map(Value::bool)
        }

        ExprKind::Call { name, args } => {
            if builtins::is_builtin(name) {
                return builtins::call_builtin(interp, name, args, expr.pos);
            }
            match interp.functions.get(name).cloned() {
                Some(def) => functions::call_function(interp, &def, args, expr.pos),
                None => Err(EvalError::program(
                    expr.pos,
                    format!("call to undefined function '{}'", name),
                )),
            }
        }
    }
}

/// Evaluate an expression in scalar context.
pub fn eval_scalar(interp: &mut Interpreter, expr: &Expr) -> Result<String, EvalError> {
    let value = eval_expr(interp, expr)?;
    to_scalar(value, expr.pos)
}

/// Evaluate an expression in boolean context.
pub fn eval_bool(interp: &mut Interpreter, expr: &Expr) -> Result<bool, EvalError> {
    Ok(is_truthy(&eval_scalar(interp, expr)?))
}

/// Unwrap a scalar, rejecting arrays.
pub fn to_scalar(value: Value, pos: Position) -> Result<String, EvalError> {
    match value {
        Value::Scalar(s) => Ok(s),
        Value::Array(_) => Err(EvalError::type_error(pos, "array used in scalar context")),
    }
}

/// Strict numeric interpretation for operators that demand numbers.
pub fn strict_number(s: &str, pos: Position) -> Result<f64, EvalError> {
    parse_strict(s)
        .ok_or_else(|| EvalError::type_error(pos, format!("'{}' is not a number", s)))
}

/// Evaluate one array index dimension to its key form.
pub fn eval_key(interp: &mut Interpreter, expr: &Expr) -> Result<String, EvalError> {
    Ok(array_key(&eval_scalar(interp, expr)?))
}

fn eval_keys(interp: &mut Interpreter, exprs: &[Expr]) -> Result<Vec<String>, EvalError> {
    exprs.iter().map(|e| eval_key(interp, e)).collect()
}

fn eval_field_index(interp: &mut Interpreter, index: &Expr) -> Result<i64, EvalError> {
    let scalar = eval_scalar(interp, index)?;
    Ok(to_number(&scalar).trunc() as i64)
}

/// The pattern string of a match operand: a regex literal contributes its
/// pattern directly, anything else is coerced to a string.
pub fn regex_operand(interp: &mut Interpreter, expr: &Expr) -> Result<String, EvalError> {
    match &expr.kind {
        ExprKind::Regex(pattern) => Ok(pattern.clone()),
        _ => eval_scalar(interp, expr),
    }
}

/// Compile a pattern, reporting a bad one at the given position.
pub fn compile_regex(pattern: &str, pos: Position) -> Result<Regex, EvalError> {
    Regex::new(pattern)
        .map_err(|_| EvalError::program(pos, format!("invalid regular expression '{}'", pattern)))
}

// ─── Binary Operators ─────────────────────────────────────────────

fn eval_binary(
    interp: &mut Interpreter,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    pos: Position,
) -> Result<Value, EvalError> {
    match op {
        BinaryOp::And => {
            if !eval_bool(interp, left)? {
                return Ok(Value::bool(false));
            }
            Ok(Value::bool(eval_bool(interp, right)?))
        }
        BinaryOp::Or => {
            if eval_bool(interp, left)? {
                return Ok(Value::bool(true));
            }
            Ok(Value::bool(eval_bool(interp, right)?))
        }

        BinaryOp::Concat => {
            let mut l = eval_scalar(interp, left)?;
            let r = eval_scalar(interp, right)?;
            l.push_str(&r);
            Ok(Value::Scalar(l))
        }

        BinaryOp::Match | BinaryOp::NotMatch => {
            let subject = eval_scalar(interp, left)?;
            let pattern = regex_operand(interp, right)?;
            let re = compile_regex(&pattern, pos)?;
            let matched = re.is_match(&subject);
            Ok(Value::bool(matched == (op == BinaryOp::Match)))
        }

        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let l = eval_scalar(interp, left)?;
            let r = eval_scalar(interp, right)?;
            let ord = compare_scalars(&l, &r);
            let result = match op {
                BinaryOp::Eq => ord.is_eq(),
                BinaryOp::Ne => ord.is_ne(),
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            };
            Ok(Value::bool(result))
        }

        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        | BinaryOp::Pow => {
            let l = strict_number(&eval_scalar(interp, left)?, pos)?;
            let r = strict_number(&eval_scalar(interp, right)?, pos)?;
            Ok(Value::number(apply_arith(op, l, r, pos)?))
        }
    }
}

fn apply_arith(op: BinaryOp, l: f64, r: f64, pos: Position) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(l + r),
        BinaryOp::Sub => Ok(l - r),
        BinaryOp::Mul => Ok(l * r),
        BinaryOp::Div => {
            if r == 0.0 {
                return Err(EvalError::type_error(pos, "division by zero"));
            }
            Ok(l / r)
        }
        BinaryOp::Mod => {
            if r == 0.0 {
                return Err(EvalError::type_error(pos, "modulo by zero"));
            }
            Ok(l % r)
        }
        BinaryOp::Pow => Ok(l.powf(r)),
        _ => unreachable!("non-arithmetic operator"),
    }
}

// ─── Unary Operators ──────────────────────────────────────────────

fn eval_unary(
    interp: &mut Interpreter,
    op: UnaryOp,
    operand: &Expr,
    pos: Position,
) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::bool(!eval_bool(interp, operand)?)),
        UnaryOp::Neg => {
            let n = strict_number(&eval_scalar(interp, operand)?, pos)?;
            Ok(Value::number(-n))
        }
        // Unary plus is lenient: the longest numeric prefix, else 0
        UnaryOp::Pos => Ok(Value::number(to_number(&eval_scalar(interp, operand)?))),
    }
}

// ─── Lvalues ──────────────────────────────────────────────────────

/// A resolved assignment target. Index expressions are evaluated exactly
/// once, so `a[i++] += 1` steps `i` a single time.
enum Lvalue {
    Variable(String),
    Field(i64),
    Element(String, Vec<String>),
}

fn resolve_lvalue(interp: &mut Interpreter, target: &Expr) -> Result<Lvalue, EvalError> {
    match &target.kind {
        ExprKind::Variable(name) => Ok(Lvalue::Variable(name.clone())),
        ExprKind::FieldRef(index) => Ok(Lvalue::Field(eval_field_index(interp, index)?)),
        ExprKind::ArrayRef { name, indices } => {
            Ok(Lvalue::Element(name.clone(), eval_keys(interp, indices)?))
        }
        _ => Err(EvalError::program(
            target.pos,
            "assignment target must be a variable, field, or array element",
        )),
    }
}

fn lvalue_read(interp: &mut Interpreter, lvalue: &Lvalue, pos: Position) -> Result<Value, EvalError> {
    match lvalue {
        Lvalue::Variable(name) => Ok(variables::get_variable(interp, name)),
        Lvalue::Field(index) => interp.records.get_field(*index, pos).map(Value::scalar),
        Lvalue::Element(name, keys) => read_array_element(interp, name, keys, pos),
    }
}

fn lvalue_write(
    interp: &mut Interpreter,
    lvalue: &Lvalue,
    value: Value,
    pos: Position,
) -> Result<(), EvalError> {
    match lvalue {
        Lvalue::Variable(name) => variables::set_variable(interp, name, value, pos),
        Lvalue::Field(index) => {
            let scalar = to_scalar(value, pos)?;
            let fs = variables::current_fs(interp);
            let ofs = variables::current_ofs(interp);
            interp.records.edit_field(*index, &scalar, &fs, &ofs, pos)
        }
        Lvalue::Element(name, keys) => {
            let scalar = to_scalar(value, pos)?;
            write_array_element(interp, name, keys, Value::Scalar(scalar), pos)
        }
    }
}

// ─── Assignment ───────────────────────────────────────────────────

fn eval_assignment(
    interp: &mut Interpreter,
    op: AssignOp,
    target: &Expr,
    value: &Expr,
    pos: Position,
) -> Result<Value, EvalError> {
    let lvalue = resolve_lvalue(interp, target)?;

    let new_value = match op {
        AssignOp::Assign => eval_expr(interp, value)?,
        _ => {
            let old = to_scalar(lvalue_read(interp, &lvalue, pos)?, pos)?;
            let old_n = strict_number(&old, pos)?;
            let rhs = strict_number(&eval_scalar(interp, value)?, pos)?;
            let arith = match op {
                AssignOp::Add => BinaryOp::Add,
                AssignOp::Sub => BinaryOp::Sub,
                AssignOp::Mul => BinaryOp::Mul,
                AssignOp::Div => BinaryOp::Div,
                AssignOp::Mod => BinaryOp::Mod,
                _ => BinaryOp::Pow,
            };
            Value::number(apply_arith(arith, old_n, rhs, pos)?)
        }
    };

    lvalue_write(interp, &lvalue, new_value.clone(), pos)?;
    Ok(new_value)
}

// ─── Increment / Decrement ────────────────────────────────────────

enum StepOrder {
    Pre,
    Post,
}

/// Shared engine for `++`/`--`. The bound value must be numeric; the
/// post forms return the original value, the pre forms the updated one.
fn eval_step(
    interp: &mut Interpreter,
    target: &Expr,
    delta: f64,
    order: StepOrder,
    pos: Position,
) -> Result<Value, EvalError> {
    let lvalue = resolve_lvalue(interp, target)?;
    let old = strict_number(&to_scalar(lvalue_read(interp, &lvalue, pos)?, pos)?, pos)?;
    let new = old + delta;
    lvalue_write(interp, &lvalue, Value::number(new), pos)?;
    Ok(Value::number(match order {
        StepOrder::Pre => new,
        StepOrder::Post => old,
    }))
}

// ─── Arrays ───────────────────────────────────────────────────────

/// Read through an index chain. A missing element at any level yields
/// the empty scalar and does not create anything (membership tests stay
/// honest). A scalar in the middle of the chain is a type error.
fn read_array_element(
    interp: &Interpreter,
    name: &str,
    keys: &[String],
    pos: Position,
) -> Result<Value, EvalError> {
    let mut current = match interp.env.get(name) {
        Some(value) => value,
        None => return Ok(Value::empty()),
    };
    for key in keys {
        let map = match current {
            Value::Array(map) => map,
            Value::Scalar(_) => {
                return Err(EvalError::type_error(
                    pos,
                    format!("cannot use scalar '{}' as an array", name),
                ));
            }
        };
        match map.get(key) {
            Some(value) => current = value,
            None => return Ok(Value::empty()),
        }
    }
    Ok(current.clone())
}

/// Write through an index chain, creating intermediate arrays as needed.
fn write_array_element(
    interp: &mut Interpreter,
    name: &str,
    keys: &[String],
    value: Value,
    pos: Position,
) -> Result<(), EvalError> {
    let mut node = interp.env.ensure_array(name, pos)?;
    let (last, inner) = keys.split_last().expect("index chain is never empty");

    for key in inner {
        let map = match node {
            Value::Array(map) => map,
            Value::Scalar(_) => unreachable!("chain nodes are arrays"),
        };
        let entry = map
            .entry(key.clone())
            .or_insert_with(|| Value::Array(Default::default()));
        if !entry.is_array() {
            return Err(EvalError::type_error(
                pos,
                format!("cannot use scalar element of '{}' as an array", name),
            ));
        }
        node = entry;
    }

    let map = match node {
        Value::Array(map) => map,
        Value::Scalar(_) => unreachable!("chain nodes are arrays"),
    };
    if let Some(existing) = map.get(last) {
        if existing.is_array() != value.is_array() {
            return Err(EvalError::type_error(
                pos,
                format!("cannot use array element of '{}' as a scalar", name),
            ));
        }
    }
    map.insert(last.clone(), value);
    Ok(())
}

/// Membership at the depth given by the key chain. Any missing level is
/// simply false; a scalar-bound name is a type error.
fn eval_membership(
    interp: &Interpreter,
    keys: &[String],
    array: &str,
    pos: Position,
) -> Result<bool, EvalError> {
    let mut map = match interp.env.get(array) {
        None => return Ok(false),
        Some(Value::Scalar(_)) => {
            return Err(EvalError::type_error(
                pos,
                format!("cannot use scalar '{}' as an array", array),
            ));
        }
        Some(Value::Array(map)) => map,
    };

    let (last, inner) = match keys.split_last() {
        Some(parts) => parts,
        None => return Ok(false),
    };
    for key in inner {
        match map.get(key) {
            Some(Value::Array(next)) => map = next,
            _ => return Ok(false),
        }
    }
    Ok(map.contains_key(last))
}
