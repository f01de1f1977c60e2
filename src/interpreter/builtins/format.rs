//! Printf-Style Formatting
//!
//! Backs `printf`, `sprintf`, and OFMT-driven numeric output. Supported
//! conversions: %d %i %o %x %X %u %c %s %f %e %E %g %G and %%, with the
//! flags `-`, `+`, space, and `0`, and width/precision (including `*`
//! taken from the argument list). Backslash escapes in the format string
//! are interpreted.

use crate::interpreter::value::{fmt_num, looks_like_number, to_number};

/// One parsed conversion specification.
#[derive(Debug, Default)]
struct Conversion {
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Conversion {
    fn pad(&self, text: String) -> String {
        match self.width {
            Some(width) if text.len() < width => {
                if self.left_align {
                    format!("{:<width$}", text, width = width)
                } else {
                    format!("{:>width$}", text, width = width)
                }
            }
            _ => text,
        }
    }

    /// Integer-style rendering shared by %d/%i/%u/%o/%x/%X: optional
    /// sign, precision as minimum digits, zero padding under width.
    fn pad_integer(&self, sign: &str, mut digits: String) -> String {
        if let Some(precision) = self.precision {
            while digits.len() < precision {
                digits.insert(0, '0');
            }
        }
        if !self.left_align && self.zero_pad && self.precision.is_none() {
            if let Some(width) = self.width {
                let pad_to = width.saturating_sub(sign.len());
                if digits.len() < pad_to {
                    return format!("{}{:0>width$}", sign, digits, width = pad_to);
                }
            }
        }
        self.pad(format!("{}{}", sign, digits))
    }

    fn sign_for(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        }
    }
}

/// Format `values` according to a printf-style format string.
///
/// Missing arguments format as empty strings (0 for numeric
/// conversions), matching the permissive behavior of the classic tools.
pub fn format_printf(fmt: &str, values: &[String]) -> String {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::new();
    let mut next_value = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '%' if i + 1 < chars.len() => {
                i += 1;
                match parse_conversion(&chars, &mut i, values, &mut next_value) {
                    Some((conv, specifier)) => {
                        if specifier == '%' {
                            out.push('%');
                        } else {
                            let arg = values.get(next_value).cloned().unwrap_or_default();
                            next_value += 1;
                            out.push_str(&render(&conv, specifier, &arg));
                        }
                    }
                    // Ran off the end mid-specification: emit verbatim
                    None => {
                        out.push('%');
                        while i < chars.len() {
                            out.push(chars[i]);
                            i += 1;
                        }
                    }
                }
            }
            '\\' if i + 1 < chars.len() => {
                i += 1;
                match chars[i] {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    other => out.push(other),
                }
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Parse flags, width, and precision starting at `*i` (just past the
/// `%`). Leaves `*i` past the conversion character on success.
fn parse_conversion(
    chars: &[char],
    i: &mut usize,
    values: &[String],
    next_value: &mut usize,
) -> Option<(Conversion, char)> {
    let mut conv = Conversion::default();

    while *i < chars.len() {
        match chars[*i] {
            '-' => conv.left_align = true,
            '+' => conv.plus_sign = true,
            ' ' => conv.space_sign = true,
            '0' => conv.zero_pad = true,
            '#' => {}
            _ => break,
        }
        *i += 1;
    }

    if chars.get(*i) == Some(&'*') {
        let w = values.get(*next_value).map(|v| to_number(v) as i64).unwrap_or(0);
        *next_value += 1;
        *i += 1;
        if w < 0 {
            conv.left_align = true;
            conv.width = Some((-w) as usize);
        } else {
            conv.width = Some(w as usize);
        }
    } else {
        let mut width = 0usize;
        let mut saw = false;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            width = width * 10 + chars[*i].to_digit(10).unwrap() as usize;
            saw = true;
            *i += 1;
        }
        if saw {
            conv.width = Some(width);
        }
    }

    if chars.get(*i) == Some(&'.') {
        *i += 1;
        if chars.get(*i) == Some(&'*') {
            let p = values.get(*next_value).map(|v| to_number(v) as i64).unwrap_or(0);
            *next_value += 1;
            *i += 1;
            conv.precision = Some(p.max(0) as usize);
        } else {
            let mut precision = 0usize;
            while *i < chars.len() && chars[*i].is_ascii_digit() {
                precision = precision * 10 + chars[*i].to_digit(10).unwrap() as usize;
                *i += 1;
            }
            conv.precision = Some(precision);
        }
    }

    // Length modifiers are accepted and ignored
    while *i < chars.len() && matches!(chars[*i], 'l' | 'h' | 'z' | 'j') {
        *i += 1;
    }

    let specifier = *chars.get(*i)?;
    *i += 1;
    Some((conv, specifier))
}

fn render(conv: &Conversion, specifier: char, arg: &str) -> String {
    match specifier {
        's' => {
            let mut s = arg.to_string();
            if let Some(precision) = conv.precision {
                s = s.chars().take(precision).collect();
            }
            conv.pad(s)
        }
        'd' | 'i' => {
            let n = to_number(arg) as i64;
            conv.pad_integer(conv.sign_for(n < 0), n.abs().to_string())
        }
        'u' => {
            let n = to_number(arg) as i64 as u64;
            conv.pad_integer("", n.to_string())
        }
        'o' => {
            let n = to_number(arg) as i64;
            conv.pad_integer(if n < 0 { "-" } else { "" }, format!("{:o}", n.abs()))
        }
        'x' | 'X' => {
            let n = to_number(arg) as i64;
            let mut digits = format!("{:x}", n.abs());
            if specifier == 'X' {
                digits = digits.to_uppercase();
            }
            conv.pad_integer(if n < 0 { "-" } else { "" }, digits)
        }
        'c' => {
            let c = if looks_like_number(arg) {
                char::from_u32(to_number(arg) as u32).unwrap_or('\0')
            } else {
                arg.chars().next().unwrap_or('\0')
            };
            conv.pad(c.to_string())
        }
        'f' => {
            let n = to_number(arg);
            conv.pad(format!("{:.prec$}", n, prec = conv.precision.unwrap_or(6)))
        }
        'e' | 'E' => {
            let n = to_number(arg);
            let mut s = format!("{:.prec$e}", n, prec = conv.precision.unwrap_or(6));
            if specifier == 'E' {
                s = s.to_uppercase();
            }
            conv.pad(s)
        }
        'g' | 'G' => {
            let n = to_number(arg);
            let mut s = format_general(n, conv.precision.unwrap_or(6));
            if specifier == 'G' {
                s = s.to_uppercase();
            }
            conv.pad(s)
        }
        other => format!("%{}", other),
    }
}

/// %g formatting: scientific for extreme exponents, fixed otherwise,
/// trailing zeros trimmed.
fn format_general(n: f64, precision: usize) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);
    let exponent = n.abs().log10().floor() as i32;

    if exponent < -4 || exponent >= precision as i32 {
        let s = format!("{:.prec$e}", n, prec = precision.saturating_sub(1));
        trim_zeros_scientific(&s)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let s = format!("{:.prec$}", n, prec = decimals);
        trim_zeros(&s)
    }
}

fn trim_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    trimmed.to_string()
}

fn trim_zeros_scientific(s: &str) -> String {
    match s.find('e') {
        Some(e_pos) => format!("{}{}", trim_zeros(&s[..e_pos]), &s[e_pos..]),
        None => s.to_string(),
    }
}

/// Render a number through an OFMT-style format string. Integral values
/// print as integers without consulting the format.
pub fn format_number(n: f64, ofmt: &str) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < i64::MAX as f64 {
        return format!("{}", n as i64);
    }
    format_printf(ofmt, &[fmt_num(n)])
}

/// Serialize a scalar for `print`: non-integral numeric values go
/// through OFMT, everything else is verbatim.
pub fn display_scalar(s: &str, ofmt: &str) -> String {
    if looks_like_number(s) {
        let n = to_number(s);
        if n != n.trunc() {
            return format_number(n, ofmt);
        }
    }
    s.to_string()
}
