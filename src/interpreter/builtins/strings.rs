//! String Built-ins
//!
//! length, index, substr, tolower, toupper, sprintf, split, sub, gsub,
//! and match. Substitution targets default to the whole record; an
//! explicit variable target is passed by reference and written back by
//! the dispatcher.

use crate::interpreter::builtins::format::format_printf;
use crate::interpreter::builtins::BuiltinCall;
use crate::interpreter::errors::EvalError;
use crate::interpreter::expressions::{compile_regex, to_scalar};
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::record::split_fields;
use crate::interpreter::value::{to_number, ArrayMap, Value};
use crate::interpreter::variables;

/// length(x): element count for an array, character count for a scalar,
/// defaulting to the current record.
pub fn length(interp: &Interpreter, call: &BuiltinCall) -> Result<Value, EvalError> {
    let value = call.value("varItem").or_else(|| call.value("item"));
    let n = match value {
        Some(Value::Array(map)) => map.len(),
        Some(Value::Scalar(s)) => s.chars().count(),
        None => interp.records.record().chars().count(),
    };
    Ok(Value::number(n as f64))
}

/// index(haystack, needle): 1-based character position, 0 when absent.
pub fn index_of(call: &BuiltinCall) -> Result<Value, EvalError> {
    let haystack = call.scalar("haystack")?;
    let needle = call.scalar("needle")?;
    let position = match haystack.find(&needle) {
        Some(byte_pos) => haystack[..byte_pos].chars().count() + 1,
        None => 0,
    };
    Ok(Value::number(position as f64))
}

/// substr(s, start [, count]): 1-based, clamped to the string bounds.
/// A zero or negative count yields the empty string; a missing count
/// means "to the end".
pub fn substr(call: &BuiltinCall) -> Result<Value, EvalError> {
    let s = call.scalar("string")?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;

    let start = to_number(&call.scalar("start")?).trunc() as i64;
    // The selected span is positions max(1, start) ..= start + count - 1,
    // clamped to the string
    let first = start.max(1);
    let last = if call.has("count") {
        let count = to_number(&call.scalar("count")?).trunc() as i64;
        (start + count - 1).min(len)
    } else {
        len
    };

    if first > last || first > len {
        return Ok(Value::scalar(""));
    }
    let piece: String = chars[(first - 1) as usize..last as usize].iter().collect();
    Ok(Value::scalar(piece))
}

/// tolower(s): Unicode-aware case fold.
pub fn tolower(call: &BuiltinCall) -> Result<Value, EvalError> {
    Ok(Value::scalar(call.scalar("string")?.to_lowercase()))
}

/// toupper(s): Unicode-aware case fold.
pub fn toupper(call: &BuiltinCall) -> Result<Value, EvalError> {
    Ok(Value::scalar(call.scalar("string")?.to_uppercase()))
}

/// sprintf(fmt, ...): printf into a string value.
pub fn sprintf(call: &BuiltinCall) -> Result<Value, EvalError> {
    if call.arg_count() == 0 {
        return Err(EvalError::argument(call.pos, "sprintf requires a format string"));
    }
    let fmt = to_scalar(call.positional(1).cloned().unwrap(), call.pos)?;
    let mut values = Vec::new();
    for i in 2..=call.arg_count() {
        values.push(to_scalar(call.positional(i).cloned().unwrap(), call.pos)?);
    }
    Ok(Value::scalar(format_printf(&fmt, &values)))
}

/// Expand a substitution replacement: `&` is the matched text, `\&` a
/// literal ampersand, `\\` a literal backslash.
fn expand_replacement(replacement: &str, matched: &str) -> String {
    let mut out = String::new();
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('&') => out.push('&'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '&' => out.push_str(matched),
            other => out.push(other),
        }
    }
    out
}

/// sub/gsub: replace the first (or every) match of the pattern in the
/// target, which is `$0` unless an explicit variable was given. Returns
/// the number of substitutions; a `$0` target is re-split.
pub fn substitute(
    interp: &mut Interpreter,
    call: &mut BuiltinCall,
    global: bool,
) -> Result<Value, EvalError> {
    let pattern = call.scalar("regex")?;
    let replacement = call.scalar("replacement")?;
    let re = compile_regex(&pattern, call.pos)?;

    let target = match call.has("varTarget") {
        true => call.scalar("varTarget")?,
        false => interp.records.record().to_string(),
    };

    let mut out = String::new();
    let mut last_end = 0;
    let mut count = 0;
    for m in re.find_iter(&target) {
        if !global && count == 1 {
            break;
        }
        out.push_str(&target[last_end..m.start()]);
        out.push_str(&expand_replacement(&replacement, m.as_str()));
        last_end = m.end();
        count += 1;
    }
    out.push_str(&target[last_end..]);

    if count > 0 {
        if call.has("varTarget") {
            call.set("varTarget", Value::scalar(out));
        } else {
            let fs = variables::current_fs(interp);
            let ofs = variables::current_ofs(interp);
            interp.records.edit_field(0, &out, &fs, &ofs, call.pos)?;
        }
    }
    Ok(Value::number(count as f64))
}

/// match(target, r [, groups]): 1-based position of the first match or
/// 0, maintaining RSTART/RLENGTH. With a groups variable, capture
/// groups 0..N land under the keys "0".."N".
pub fn find_match(interp: &mut Interpreter, call: &mut BuiltinCall) -> Result<Value, EvalError> {
    let target = call.scalar("target")?;
    let pattern = call.scalar("regex")?;
    let re = compile_regex(&pattern, call.pos)?;

    let (position, length, groups) = match re.captures(&target) {
        Some(caps) => {
            let whole = caps.get(0).unwrap();
            let position = target[..whole.start()].chars().count() + 1;
            let length = whole.as_str().chars().count() as i64;
            let mut groups = ArrayMap::new();
            for i in 0..caps.len() {
                let text = caps.get(i).map(|m| m.as_str()).unwrap_or("");
                groups.insert(i.to_string(), Value::scalar(text));
            }
            (position, length, groups)
        }
        None => (0, -1, ArrayMap::new()),
    };

    variables::set_variable(interp, "RSTART", Value::number(position as f64), call.pos)?;
    variables::set_variable(interp, "RLENGTH", Value::number(length as f64), call.pos)?;
    if call.has("varGroups") {
        call.set("varGroups", Value::Array(groups));
    }
    Ok(Value::number(position as f64))
}

/// split(s, a [, sep]): split into the array under the keys "1".."N",
/// returning the element count. The separator defaults to FS.
pub fn split(interp: &mut Interpreter, call: &mut BuiltinCall) -> Result<Value, EvalError> {
    let s = call.scalar("string")?;
    let sep = if call.has("regexSep") {
        call.scalar("regexSep")?
    } else {
        variables::current_fs(interp)
    };

    let parts = split_fields(&s, &sep);
    let mut array = ArrayMap::new();
    for (i, part) in parts.iter().enumerate() {
        array.insert((i + 1).to_string(), Value::scalar(part.clone()));
    }
    call.set("varParts", Value::Array(array));
    Ok(Value::number(parts.len() as f64))
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

    fn call(interp: &mut Interpreter, name: &str, args: Vec<Expr>) -> Value {
        call_builtin(interp, name, &args, pos()).unwrap()
    }

    // ─── length ──────────────────────────────────────────────────

    #[test]
    fn test_length_of_string() {
        let mut interp = make_interp();
        assert_eq!(
            call(&mut interp, "length", vec![Expr::constant("hello")]),
            Value::scalar("5")
        );
    }

    #[test]
    fn test_length_defaults_to_record() {
        let mut interp = make_interp();
        interp.records.split_and_assign("abcd", " ");
        assert_eq!(call(&mut interp, "length", vec![]), Value::scalar("4"));
    }

    #[test]
    fn test_length_of_array_counts_elements() {
        let mut interp = make_interp();
        for key in ["a", "b", "c"] {
            crate::interpreter::expressions::eval_expr(
                &mut interp,
                &Expr::assign(Expr::array("arr", vec![Expr::constant(key)]), Expr::number(1.0)),
            )
            .unwrap();
        }
        assert_eq!(
            call(&mut interp, "length", vec![Expr::variable("arr")]),
            Value::scalar("3")
        );
    }

    #[test]
    fn test_length_of_unset_variable_is_zero() {
        let mut interp = make_interp();
        assert_eq!(
            call(&mut interp, "length", vec![Expr::variable("nothing")]),
            Value::scalar("0")
        );
    }

    // ─── index ───────────────────────────────────────────────────

    #[test]
    fn test_index_found() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "index",
                vec![Expr::constant("hello"), Expr::constant("ll")]
            ),
            Value::scalar("3")
        );
    }

    #[test]
    fn test_index_missing_is_zero() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "index",
                vec![Expr::constant("hello"), Expr::constant("xyz")]
            ),
            Value::scalar("0")
        );
    }

    // ─── substr ──────────────────────────────────────────────────

    #[test]
    fn test_substr_from_position() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(2.0)]
            ),
            Value::scalar("ello")
        );
    }

    #[test]
    fn test_substr_with_count() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(2.0), Expr::number(3.0)]
            ),
            Value::scalar("ell")
        );
    }

    #[test]
    fn test_substr_start_before_one_clamps() {
        let mut interp = make_interp();
        // Positions before 1 still count against the length
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(-1.0), Expr::number(4.0)]
            ),
            Value::scalar("he")
        );
    }

    #[test]
    fn test_substr_count_clamps_to_end() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(4.0), Expr::number(100.0)]
            ),
            Value::scalar("lo")
        );
    }

    #[test]
    fn test_substr_zero_or_negative_count_is_empty() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(2.0), Expr::number(0.0)]
            ),
            Value::scalar("")
        );
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(2.0), Expr::number(-3.0)]
            ),
            Value::scalar("")
        );
    }

    #[test]
    fn test_substr_start_beyond_end_is_empty() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "substr",
                vec![Expr::constant("hello"), Expr::number(9.0)]
            ),
            Value::scalar("")
        );
    }

    // ─── case folding ────────────────────────────────────────────

    #[test]
    fn test_tolower_toupper() {
        let mut interp = make_interp();
        assert_eq!(
            call(&mut interp, "tolower", vec![Expr::constant("MiXeD")]),
            Value::scalar("mixed")
        );
        assert_eq!(
            call(&mut interp, "toupper", vec![Expr::constant("MiXeD")]),
            Value::scalar("MIXED")
        );
    }

    // ─── sprintf ─────────────────────────────────────────────────

    #[test]
    fn test_sprintf() {
        let mut interp = make_interp();
        assert_eq!(
            call(
                &mut interp,
                "sprintf",
                vec![Expr::constant("%s=%03d"), Expr::constant("n"), Expr::number(7.0)]
            ),
            Value::scalar("n=007")
        );
    }

    #[test]
    fn test_sprintf_without_format_errors() {
        let mut interp = make_interp();
        let err = call_builtin(&mut interp, "sprintf", &[], pos()).unwrap_err();
        assert!(matches!(err, EvalError::Argument { .. }));
    }

    // ─── sub / gsub ──────────────────────────────────────────────

    #[test]
    fn test_sub_on_record() {
        let mut interp = make_interp();
        interp.records.split_and_assign("foo bar", " ");
        let n = call(
            &mut interp,
            "sub",
            vec![Expr::regex("o"), Expr::constant("0")],
        );
        assert_eq!(n, Value::scalar("1"));
        assert_eq!(interp.records.record(), "f0o bar");
    }

    #[test]
    fn test_gsub_on_record_resplits() {
        let mut interp = make_interp();
        interp.records.split_and_assign("foo bar", " ");
        let n = call(
            &mut interp,
            "gsub",
            vec![Expr::regex("o"), Expr::constant("0")],
        );
        assert_eq!(n, Value::scalar("2"));
        assert_eq!(interp.records.record(), "f00 bar");
        assert_eq!(interp.records.get_field(1, pos()).unwrap(), "f00");
    }

    #[test]
    fn test_sub_variable_target_written_back() {
        let mut interp = make_interp();
        interp.env.set("t", Value::scalar("aaa"), pos()).unwrap();
        let n = call(
            &mut interp,
            "gsub",
            vec![Expr::regex("a"), Expr::constant("b"), Expr::variable("t")],
        );
        assert_eq!(n, Value::scalar("3"));
        assert_eq!(interp.env.get("t"), Some(&Value::scalar("bbb")));
    }

    #[test]
    fn test_sub_no_match_returns_zero() {
        let mut interp = make_interp();
        interp.records.split_and_assign("abc", " ");
        let n = call(
            &mut interp,
            "sub",
            vec![Expr::regex("x"), Expr::constant("y")],
        );
        assert_eq!(n, Value::scalar("0"));
        assert_eq!(interp.records.record(), "abc");
    }

    #[test]
    fn test_replacement_ampersand() {
        let mut interp = make_interp();
        interp.env.set("t", Value::scalar("hello"), pos()).unwrap();
        call(
            &mut interp,
            "sub",
            vec![Expr::regex("l"), Expr::constant("[&]"), Expr::variable("t")],
        );
        assert_eq!(interp.env.get("t"), Some(&Value::scalar("he[l]lo")));
    }

    #[test]
    fn test_replacement_escaped_ampersand() {
        assert_eq!(expand_replacement("\\&", "m"), "&");
        assert_eq!(expand_replacement("a&b", "m"), "amb");
        assert_eq!(expand_replacement("\\\\", "m"), "\\");
    }

    // ─── match ───────────────────────────────────────────────────

    #[test]
    fn test_match_sets_rstart_rlength() {
        let mut interp = make_interp();
        let n = call(
            &mut interp,
            "match",
            vec![Expr::constant("hello world"), Expr::regex("wor")],
        );
        assert_eq!(n, Value::scalar("7"));
        assert_eq!(interp.env.get("RSTART"), Some(&Value::scalar("7")));
        assert_eq!(interp.env.get("RLENGTH"), Some(&Value::scalar("3")));
    }

    #[test]
    fn test_match_miss() {
        let mut interp = make_interp();
        let n = call(
            &mut interp,
            "match",
            vec![Expr::constant("hello"), Expr::regex("xyz")],
        );
        assert_eq!(n, Value::scalar("0"));
        assert_eq!(interp.env.get("RSTART"), Some(&Value::scalar("0")));
        assert_eq!(interp.env.get("RLENGTH"), Some(&Value::scalar("-1")));
    }

    #[test]
    fn test_match_populates_groups() {
        let mut interp = make_interp();
        let n = call(
            &mut interp,
            "match",
            vec![
                Expr::constant("key=value"),
                Expr::regex("(\\w+)=(\\w+)"),
                Expr::variable("m"),
            ],
        );
        assert_eq!(n, Value::scalar("1"));
        let groups = interp.env.get("m").unwrap();
        match groups {
            Value::Array(map) => {
                assert_eq!(map.get("0"), Some(&Value::scalar("key=value")));
                assert_eq!(map.get("1"), Some(&Value::scalar("key")));
                assert_eq!(map.get("2"), Some(&Value::scalar("value")));
            }
            Value::Scalar(_) => panic!("expected array of groups"),
        }
    }

    // ─── split ───────────────────────────────────────────────────

    #[test]
    fn test_split_with_explicit_separator() {
        let mut interp = make_interp();
        let n = call(
            &mut interp,
            "split",
            vec![Expr::constant("a:b:c"), Expr::variable("parts"), Expr::constant(":")],
        );
        assert_eq!(n, Value::scalar("3"));
        match interp.env.get("parts").unwrap() {
            Value::Array(map) => {
                assert_eq!(map.get("1"), Some(&Value::scalar("a")));
                assert_eq!(map.get("3"), Some(&Value::scalar("c")));
            }
            Value::Scalar(_) => panic!("expected array"),
        }
    }

    #[test]
    fn test_split_defaults_to_fs() {
        let mut interp = make_interp();
        let n = call(
            &mut interp,
            "split",
            vec![Expr::constant("a b  c"), Expr::variable("parts")],
        );
        assert_eq!(n, Value::scalar("3"));
    }

    #[test]
    fn test_split_replaces_previous_contents() {
        let mut interp = make_interp();
        call(
            &mut interp,
            "split",
            vec![Expr::constant("a b c"), Expr::variable("parts")],
        );
        call(
            &mut interp,
            "split",
            vec![Expr::constant("x"), Expr::variable("parts")],
        );
        match interp.env.get("parts").unwrap() {
            Value::Array(map) => assert_eq!(map.len(), 1),
            Value::Scalar(_) => panic!("expected array"),
        }
    }
}
