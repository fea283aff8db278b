//! Tree-walking evaluation of parsed expressions
//!
//! Evaluation only reads: there is no assignment, no user-defined function
//! and no access to anything but the scope and a fixed set of pure
//! builtins (`Math`, `String`, `Number`, `Boolean`, `JSON.stringify`,
//! `Object.keys`, string/array/number methods).

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::value::{format_number, Value};
use super::{ExprError, Result, Scope};
use std::cmp::Ordering;

/// Namespaces that only exist as call targets or constant holders
const NAMESPACES: &[&str] = &["Math", "JSON", "Object", "Array", "Number", "String"];

/// Longest string `repeat`, `padStart` and `padEnd` will build
const MAX_BUILT_LEN: f64 = 10_000.0;

/// Evaluate `expr` against `scope`
pub fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value> {
    Ok(eval_chain(expr, scope)?.unwrap_or(Value::Undefined))
}

/// Resolve a dotted path without raising on missing intermediates
pub fn resolve_path(path: &str, scope: &dyn Scope) -> Value {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Undefined;
    };
    let mut current = Value::from_optional_json(scope.lookup(first).as_ref());
    for segment in segments {
        if current.is_nullish() {
            return Value::Undefined;
        }
        current = read_property(&current, segment);
    }
    current
}

/// Evaluate one link of a member chain; `None` means an optional link
/// short-circuited the rest of the chain
fn eval_chain(expr: &Expr, scope: &dyn Scope) -> Result<Option<Value>> {
    match expr {
        Expr::Member {
            object,
            property,
            optional,
        } => {
            if let Some(value) = namespace_constant(object, property, scope) {
                return Ok(Some(value));
            }
            let Some(target) = eval_chain(object, scope)? else {
                return Ok(None);
            };
            access(&target, property, *optional)
        }
        Expr::Index {
            object,
            index,
            optional,
        } => {
            let Some(target) = eval_chain(object, scope)? else {
                return Ok(None);
            };
            let key = eval(index, scope)?;
            let key = match key {
                Value::Number(n) => format_number(n),
                other => other.to_string(),
            };
            access(&target, &key, *optional)
        }
        Expr::Call { callee, args } => eval_call(callee, args, scope),
        other => eval_plain(other, scope).map(Some),
    }
}

fn access(target: &Value, property: &str, optional: bool) -> Result<Option<Value>> {
    if target.is_nullish() {
        if optional {
            return Ok(None);
        }
        return Err(ExprError::Type(format!(
            "Cannot read properties of {} (reading '{}')",
            target, property
        )));
    }
    Ok(Some(read_property(target, property)))
}

/// Property read on a non-nullish value
fn read_property(target: &Value, property: &str) -> Value {
    match target {
        Value::Object(_) => target.get(property).cloned().unwrap_or_default(),
        Value::Array(items) => {
            if property == "length" {
                return Value::Number(items.len() as f64);
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or_default()
        }
        Value::String(s) => {
            if property == "length" {
                return Value::Number(s.chars().count() as f64);
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default()
        }
        _ => Value::Undefined,
    }
}

fn is_global(name: &str, scope: &dyn Scope) -> bool {
    scope.lookup(name).is_none()
}

fn namespace_constant(object: &Expr, property: &str, scope: &dyn Scope) -> Option<Value> {
    let Expr::Ident(name) = object else {
        return None;
    };
    if !NAMESPACES.contains(&name.as_str()) || !is_global(name, scope) {
        return None;
    }
    let value = match (name.as_str(), property) {
        ("Math", "PI") => std::f64::consts::PI,
        ("Math", "E") => std::f64::consts::E,
        ("Number", "MAX_SAFE_INTEGER") => 9_007_199_254_740_991.0,
        ("Number", "MIN_SAFE_INTEGER") => -9_007_199_254_740_991.0,
        _ => return None,
    };
    Some(Value::Number(value))
}

fn eval_plain(expr: &Expr, scope: &dyn Scope) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Ident(name) => match scope.lookup(name) {
            Some(json) => Ok(Value::from_json(&json)),
            None => match name.as_str() {
                "undefined" => Ok(Value::Undefined),
                "NaN" => Ok(Value::Number(f64::NAN)),
                "Infinity" => Ok(Value::Number(f64::INFINITY)),
                _ => Err(ExprError::Reference(name.clone())),
            },
        },

        Expr::Unary(UnaryOp::Typeof, operand) => match eval(operand, scope) {
            Ok(value) => Ok(Value::String(value.type_name().to_string())),
            Err(ExprError::Reference(_)) => Ok(Value::String("undefined".to_string())),
            Err(err) => Err(err),
        },

        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
                UnaryOp::Typeof => Value::String(value.type_name().to_string()),
            })
        }

        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, scope)?;
            let rhs = eval(rhs, scope)?;
            Ok(binary(*op, &lhs, &rhs))
        }

        Expr::Logical(op, lhs, rhs) => {
            let lhs = eval(lhs, scope)?;
            let take_lhs = match op {
                LogicalOp::And => !lhs.truthy(),
                LogicalOp::Or => lhs.truthy(),
                LogicalOp::Coalesce => !lhs.is_nullish(),
            };
            if take_lhs {
                Ok(lhs)
            } else {
                eval(rhs, scope)
            }
        }

        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval(test, scope)?.truthy() {
                eval(consequent, scope)
            } else {
                eval(alternate, scope)
            }
        }

        Expr::Array(items) => Ok(Value::Array(
            items
                .iter()
                .map(|item| eval(item, scope))
                .collect::<Result<Vec<_>>>()?,
        )),

        Expr::Object(entries) => {
            let mut out: Vec<(String, Value)> = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let value = eval(value, scope)?;
                match out.iter_mut().find(|(k, _)| k == key) {
                    Some(slot) => slot.1 = value,
                    None => out.push((key.clone(), value)),
                }
            }
            Ok(Value::Object(out))
        }

        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => eval(expr, scope),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let stringy = |v: &Value| {
                matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_))
            };
            if stringy(lhs) || stringy(rhs) {
                Value::String(format!("{}{}", lhs, rhs))
            } else {
                Value::Number(lhs.to_number() + rhs.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(rhs)),
        BinaryOp::StrictNe => Value::Bool(!lhs.strict_equals(rhs)),
        BinaryOp::Eq => Value::Bool(lhs.loose_equals(rhs)),
        BinaryOp::Ne => Value::Bool(!lhs.loose_equals(rhs)),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

/// Relational comparison; `None` when either side is NaN
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

// ===== Calls =====

fn eval_call(callee: &Expr, args: &[Expr], scope: &dyn Scope) -> Result<Option<Value>> {
    let eval_args = || -> Result<Vec<Value>> { args.iter().map(|a| eval(a, scope)).collect() };

    match callee {
        Expr::Ident(name) if is_global(name, scope) => {
            let args = eval_args()?;
            call_global(name, &args).map(Some)
        }
        Expr::Member {
            object,
            property,
            optional,
        } => {
            if let Expr::Ident(name) = object.as_ref() {
                if NAMESPACES.contains(&name.as_str()) && is_global(name, scope) {
                    let args = eval_args()?;
                    return call_static(name, property, &args).map(Some);
                }
            }
            let Some(target) = eval_chain(object, scope)? else {
                return Ok(None);
            };
            if target.is_nullish() {
                if *optional {
                    return Ok(None);
                }
                return Err(ExprError::Type(format!(
                    "Cannot read properties of {} (reading '{}')",
                    target, property
                )));
            }
            let args = eval_args()?;
            call_method(&target, property, &args).map(Some)
        }
        other => Err(ExprError::Type(format!(
            "{} is not a function",
            describe(other)
        ))),
    }
}

fn describe(expr: &Expr) -> String {
    expr.as_path().unwrap_or_else(|| "expression".to_string())
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn call_global(name: &str, args: &[Value]) -> Result<Value> {
    Ok(match name {
        "String" => Value::String(args.first().map(Value::to_string).unwrap_or_default()),
        "Number" => Value::Number(args.first().map(Value::to_number).unwrap_or(0.0)),
        "Boolean" => Value::Bool(arg(args, 0).truthy()),
        "parseInt" => Value::Number(parse_int(&arg(args, 0).to_string(), &arg(args, 1))),
        "parseFloat" => Value::Number(parse_float(&arg(args, 0).to_string())),
        "isNaN" => Value::Bool(arg(args, 0).to_number().is_nan()),
        "isFinite" => Value::Bool(arg(args, 0).to_number().is_finite()),
        _ => return Err(ExprError::Reference(name.to_string())),
    })
}

fn call_static(namespace: &str, name: &str, args: &[Value]) -> Result<Value> {
    let numbers = || args.iter().map(Value::to_number);
    let first = || arg(args, 0).to_number();

    Ok(match (namespace, name) {
        ("Math", "abs") => Value::Number(first().abs()),
        ("Math", "floor") => Value::Number(first().floor()),
        ("Math", "ceil") => Value::Number(first().ceil()),
        ("Math", "round") => Value::Number((first() + 0.5).floor()),
        ("Math", "trunc") => Value::Number(first().trunc()),
        ("Math", "sign") => {
            let n = first();
            Value::Number(if n.is_nan() || n == 0.0 { n } else { n.signum() })
        }
        ("Math", "sqrt") => Value::Number(first().sqrt()),
        ("Math", "pow") => Value::Number(first().powf(arg(args, 1).to_number())),
        ("Math", "min") => Value::Number(
            numbers().fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
        ),
        ("Math", "max") => Value::Number(
            numbers().fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
        ),
        ("JSON", "stringify") => match arg(args, 0).to_json() {
            Some(json) => Value::String(json.to_string()),
            None => Value::Undefined,
        },
        ("Object", "keys") => match arg(args, 0) {
            Value::Object(entries) => Value::Array(entries.into_iter().map(|(k, _)| Value::String(k)).collect()),
            Value::Array(items) => Value::Array((0..items.len()).map(|i| Value::String(i.to_string())).collect()),
            _ => Value::Array(Vec::new()),
        },
        ("Object", "values") => match arg(args, 0) {
            Value::Object(entries) => Value::Array(entries.into_iter().map(|(_, v)| v).collect()),
            Value::Array(items) => Value::Array(items),
            _ => Value::Array(Vec::new()),
        },
        ("Array", "isArray") => Value::Bool(matches!(arg(args, 0), Value::Array(_))),
        ("Number", "isInteger") => Value::Bool(matches!(arg(args, 0), Value::Number(n) if n.is_finite() && n.fract() == 0.0)),
        ("Number", "parseFloat") => Value::Number(parse_float(&arg(args, 0).to_string())),
        ("Number", "parseInt") => Value::Number(parse_int(&arg(args, 0).to_string(), &arg(args, 1))),
        _ => {
            return Err(ExprError::Type(format!(
                "{}.{} is not a function",
                namespace, name
            )))
        }
    })
}

fn call_method(target: &Value, name: &str, args: &[Value]) -> Result<Value> {
    let result = match target {
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Number(n) => number_method(*n, name, args),
        _ => None,
    };
    match result {
        Some(value) => Ok(value),
        None if name == "toString" => Ok(Value::String(target.to_string())),
        None => Err(ExprError::Type(format!(
            "{}.{} is not a function",
            target.type_name(),
            name
        ))),
    }
}

/// Resolve a possibly negative position against `len`, clamped to `0..=len`
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        (n as usize).min(len)
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Value> {
    let text = |i: usize| arg(args, i).to_string();
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    Some(match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "trimStart" => Value::String(s.trim_start().to_string()),
        "trimEnd" => Value::String(s.trim_end().to_string()),
        "includes" => Value::Bool(s.contains(text(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text(0).as_str())),
        "indexOf" => Value::Number(
            s.find(text(0).as_str())
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        ),
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            Value::String(chars[start..end.max(start)].iter().collect())
        }
        "substring" => {
            let clamp = |v: Value, default: usize| {
                if v.is_undefined() {
                    return default;
                }
                let n = v.to_number();
                if n.is_nan() || n < 0.0 {
                    0
                } else {
                    (n as usize).min(len)
                }
            };
            let a = clamp(arg(args, 0), 0);
            let b = clamp(arg(args, 1), len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::String(chars[start..end].iter().collect())
        }
        "charAt" => Value::String(
            chars
                .get(arg(args, 0).to_number().max(0.0) as usize)
                .map(|c| c.to_string())
                .unwrap_or_default(),
        ),
        "at" => {
            let n = arg(args, 0).to_number().trunc();
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                chars
                    .get(index as usize)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default()
            }
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::String(s.to_string())],
                sep => {
                    let sep = sep.to_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::Array(parts)
        }
        "replace" => Value::String(s.replacen(text(0).as_str(), &text(1), 1)),
        "replaceAll" => Value::String(s.replace(text(0).as_str(), &text(1))),
        "repeat" => {
            let count = arg(args, 0).to_number();
            if !(0.0..=MAX_BUILT_LEN).contains(&count) {
                return Some(Value::String(String::new()));
            }
            Value::String(s.repeat(count as usize))
        }
        "padStart" | "padEnd" => {
            let target = arg(args, 0).to_number();
            if !(0.0..=MAX_BUILT_LEN).contains(&target) {
                return Some(Value::String(s.to_string()));
            }
            let target = target as usize;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                v => v.to_string(),
            };
            if target <= len || fill.is_empty() {
                return Some(Value::String(s.to_string()));
            }
            let padding: String = fill.chars().cycle().take(target - len).collect();
            if name == "padStart" {
                Value::String(format!("{}{}", padding, s))
            } else {
                Value::String(format!("{}{}", s, padding))
            }
        }
        "concat" => Value::String(args.iter().fold(s.to_string(), |mut acc, v| {
            acc.push_str(&v.to_string());
            acc
        })),
        _ => return None,
    })
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Option<Value> {
    let len = items.len();
    Some(match name {
        "includes" => {
            let needle = arg(args, 0);
            Value::Bool(items.iter().any(|item| {
                item.strict_equals(&needle)
                    || matches!((item, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
            }))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            Value::Number(
                items
                    .iter()
                    .position(|item| item.strict_equals(&needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            )
        }
        "join" => {
            let sep = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                v => v.to_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&sep),
            )
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            Value::Array(items[start..end.max(start)].to_vec())
        }
        "concat" => {
            let mut out = items.to_vec();
            for value in args {
                match value {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::Array(out)
        }
        "at" => {
            let n = arg(args, 0).to_number().trunc();
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or_default()
            }
        }
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        _ => return None,
    })
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Option<Value> {
    Some(match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
            if n.is_finite() {
                Value::String(format!("{:.*}", digits, n))
            } else {
                Value::String(format_number(n))
            }
        }
        "toString" => Value::String(format_number(n)),
        _ => return None,
    })
}

/// `parseFloat`: the longest numeric prefix, `NaN` when there is none
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    if trimmed.starts_with("Infinity") || trimmed.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if trimmed.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    // Longest prefix that parses as a number
    let candidate: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    (1..=candidate.len())
        .rev()
        .find_map(|end| {
            let prefix = &candidate[..end];
            if prefix.ends_with(['e', 'E', '+', '-']) {
                return None;
            }
            prefix.parse::<f64>().ok()
        })
        .unwrap_or(f64::NAN)
}

fn parse_int(text: &str, radix: &Value) -> f64 {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut radix = match radix.to_number() {
        r if r.is_nan() || r == 0.0 => 10,
        r => r as u32,
    };
    let mut digits = digits;
    if radix == 16 || (radix == 10 && (digits.starts_with("0x") || digits.starts_with("0X"))) {
        if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            digits = rest;
            radix = 16;
        }
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let valid: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    let magnitude = valid
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;
    use crate::path::State;
    use serde_json::json;

    fn scope() -> State {
        match json!({
            "count": 3,
            "name": "Ada",
            "user": {"profile": {"email": "ada@example.com"}, "tags": ["a", "b"]},
            "items": [1, 2, 3],
            "empty": null,
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn run(source: &str) -> Result<Value> {
        eval(&parse(source).unwrap(), &scope())
    }

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(run("count * 2 + 1").unwrap(), Value::Number(7.0));
        assert_eq!(run("'Hi ' + name + '!'").unwrap(), Value::from("Hi Ada!"));
        assert_eq!(run("count + '1'").unwrap(), Value::from("31"));
        assert_eq!(run("7 % 4").unwrap(), Value::Number(3.0));
        assert_eq!(run("1 / 0").unwrap(), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(run("count > 2 && name === 'Ada'").unwrap(), Value::Bool(true));
        assert_eq!(run("count == '3'").unwrap(), Value::Bool(true));
        assert_eq!(run("count === '3'").unwrap(), Value::Bool(false));
        assert_eq!(run("empty ?? 'fallback'").unwrap(), Value::from("fallback"));
        assert_eq!(run("0 || 'x'").unwrap(), Value::from("x"));
        assert_eq!(run("count ? 'yes' : 'no'").unwrap(), Value::from("yes"));
        assert_eq!(run("'b' > 'a'").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_member_access() {
        assert_eq!(run("user.profile.email").unwrap(), Value::from("ada@example.com"));
        assert_eq!(run("user['tags'][1]").unwrap(), Value::from("b"));
        assert_eq!(run("items.length").unwrap(), Value::Number(3.0));
        assert_eq!(run("user.missing").unwrap(), Value::Undefined);
        assert_eq!(run("user.missing?.deep.er").unwrap(), Value::Undefined);
        assert!(matches!(run("user.missing.deep"), Err(ExprError::Type(_))));
    }

    #[test]
    fn test_unknown_identifier() {
        assert!(matches!(run("nope + 1"), Err(ExprError::Reference(name)) if name == "nope"));
        assert_eq!(run("typeof nope").unwrap(), Value::from("undefined"));
        assert_eq!(run("typeof count").unwrap(), Value::from("number"));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(run("name.toUpperCase()").unwrap(), Value::from("ADA"));
        assert_eq!(run("items.includes(2)").unwrap(), Value::Bool(true));
        assert_eq!(run("items.join('-')").unwrap(), Value::from("1-2-3"));
        assert_eq!(run("Math.max(count, 10)").unwrap(), Value::Number(10.0));
        assert_eq!(run("Math.round(2.5)").unwrap(), Value::Number(3.0));
        assert_eq!(run("(1.005).toFixed(1)").unwrap(), Value::from("1.0"));
        assert_eq!(run("String(count) + Number('4')").unwrap(), Value::from("34"));
        assert_eq!(run("parseInt('42px')").unwrap(), Value::Number(42.0));
        assert_eq!(run("parseFloat('3.5e1x')").unwrap(), Value::Number(35.0));
        assert_eq!(run("Object.keys(user).length").unwrap(), Value::Number(2.0));
        assert_eq!(run("name.slice(-2)").unwrap(), Value::from("da"));
        assert_eq!(run("JSON.stringify({a: [1, 2]})").unwrap(), Value::from(r#"{"a":[1,2]}"#));
        assert!(matches!(run("name.explode()"), Err(ExprError::Type(_))));
    }

    #[test]
    fn test_built_strings_are_capped() {
        assert_eq!(run("name.padStart(5, '*')").unwrap(), Value::from("**Ada"));
        assert_eq!(run("name.padEnd(4)").unwrap(), Value::from("Ada "));
        assert_eq!(run("name.padStart(1e9, '*')").unwrap(), Value::from("Ada"));
        assert_eq!(run("name.padEnd(1e9)").unwrap(), Value::from("Ada"));
        assert_eq!(run("'x'.repeat(1e9)").unwrap(), Value::from(""));
    }

    #[test]
    fn test_parse_float_takes_the_numeric_prefix() {
        assert_eq!(parse_float("2.5abc"), 2.5);
        assert_eq!(parse_float("  -3e2px"), -300.0);
        assert!(parse_float("abc").is_nan());
        assert!(parse_float("").is_nan());
    }

    #[test]
    fn test_resolve_path_never_fails() {
        let s = scope();
        assert_eq!(resolve_path("user.profile.email", &s), Value::from("ada@example.com"));
        assert_eq!(resolve_path("x.y.z", &s), Value::Undefined);
        assert_eq!(resolve_path("empty.y", &s), Value::Undefined);
        assert_eq!(resolve_path("user.tags.length", &s), Value::Number(2.0));
    }
}
