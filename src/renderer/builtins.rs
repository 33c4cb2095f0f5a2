//! Built-in properties, methods and global helpers

use super::eval::EvalError;
use crate::value::{format_number, Value};

/// Global objects whose members are callable helpers
pub const NAMESPACES: &[&str] = &["Math", "JSON", "Object", "Array"];

/// Longest string a method may build
pub const MAX_STRING_LENGTH: f64 = 536_870_888.0;

type Outcome = Option<Result<Value, EvalError>>;

/// Key used when indexing with `target[key]`
pub fn property_key(key: &Value) -> String {
    match key {
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        other => other.to_display_string(),
    }
}

/// Read a property; unknown properties are `undefined`
pub fn get_property(target: &Value, key: &str) -> Value {
    match target {
        Value::Object(map) => map.get(key).cloned().unwrap_or_default(),
        Value::Array(items) => match key {
            "length" => Value::from(items.len()),
            _ => array_index(key)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
        },
        Value::String(s) => match key {
            "length" => Value::from(s.chars().count()),
            _ => array_index(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
        },
        _ => Value::Undefined,
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

/// `String(x)`, `Number(x)`, `Boolean(x)`
pub fn call_function(name: &str, args: &[Value]) -> Outcome {
    let first = args.first();
    let value = match name {
        "String" => Value::String(first.map(Value::to_display_string).unwrap_or_default()),
        "Number" => Value::Number(first.map_or(0.0, Value::to_number)),
        "Boolean" => Value::Bool(first.is_some_and(Value::is_truthy)),
        _ => return None,
    };
    Some(Ok(value))
}

/// `Math.*`, `JSON.*`, `Object.*` and `Array.*`
pub fn call_namespace(namespace: &str, name: &str, args: &[Value]) -> Outcome {
    let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
    let number = |i: usize| arg(i).to_number();

    let value = match (namespace, name) {
        ("Math", "floor") => Value::Number(number(0).floor()),
        ("Math", "ceil") => Value::Number(number(0).ceil()),
        ("Math", "round") => Value::Number((number(0) + 0.5).floor()),
        ("Math", "abs") => Value::Number(number(0).abs()),
        ("Math", "min") => Value::Number(
            args.iter()
                .map(Value::to_number)
                .fold(f64::INFINITY, |a, b| if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }),
        ),
        ("Math", "max") => Value::Number(
            args.iter()
                .map(Value::to_number)
                .fold(f64::NEG_INFINITY, |a, b| if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }),
        ),
        ("JSON", "stringify") => match arg(0) {
            Value::Undefined => Value::Undefined,
            value => Value::String(value.to_json().to_string()),
        },
        ("Object", "keys") => Value::array(keys(&arg(0))),
        ("Object", "values") => Value::array(values(&arg(0))),
        ("Array", "isArray") => Value::Bool(matches!(arg(0), Value::Array(_))),
        _ => return None,
    };
    Some(Ok(value))
}

fn keys(target: &Value) -> Vec<Value> {
    match target {
        Value::Object(map) => map.keys().map(|k| Value::from(k.as_str())).collect(),
        Value::Array(items) => (0..items.len()).map(|i| Value::from(i.to_string())).collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Value::from(i.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn values(target: &Value) -> Vec<Value> {
    match target {
        Value::Object(map) => map.values().cloned().collect(),
        Value::Array(items) => items.to_vec(),
        Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
        _ => Vec::new(),
    }
}

/// Call a method on a non-nullish value
pub fn call_method(target: &Value, name: &str, args: &[Value]) -> Outcome {
    match target {
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Number(n) => number_method(*n, name, args),
        Value::Bool(b) if name == "toString" => Some(Ok(Value::String(b.to_string()))),
        _ => None,
    }
}

/// Integer argument, `NaN` treated as zero
fn integer(args: &[Value], i: usize, default: f64) -> f64 {
    match args.get(i) {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            if n.is_nan() {
                0.0
            } else {
                n.trunc()
            }
        }
    }
}

fn invalid_string_length() -> EvalError {
    EvalError::Invalid("Invalid string length".to_string())
}

/// Resolve a possibly negative position against `len`
fn relative(position: f64, len: usize) -> usize {
    let len = len as f64;
    let resolved = if position < 0.0 {
        (len + position).max(0.0)
    } else {
        position.min(len)
    };
    resolved as usize
}

fn string_arg(args: &[Value], i: usize) -> String {
    args.get(i).map(Value::to_display_string).unwrap_or_else(|| "undefined".to_string())
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Outcome {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let substring = |from: usize, to: usize| -> String {
        if from >= to {
            String::new()
        } else {
            chars[from..to].iter().collect()
        }
    };

    let value = match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Bool(s.contains(string_arg(args, 0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(string_arg(args, 0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(string_arg(args, 0).as_str())),
        "indexOf" => {
            let needle = string_arg(args, 0);
            let from = relative(integer(args, 1, 0.0).max(0.0), len);
            let haystack = substring(from, len);
            match haystack.find(needle.as_str()) {
                Some(byte) => Value::from(from + haystack[..byte].chars().count()),
                None => Value::Number(-1.0),
            }
        }
        "slice" => {
            let from = relative(integer(args, 0, 0.0), len);
            let to = relative(integer(args, 1, len as f64), len);
            Value::String(substring(from, to))
        }
        "substring" => {
            let clamp = |n: f64| n.clamp(0.0, len as f64) as usize;
            let a = clamp(integer(args, 0, 0.0));
            let b = clamp(integer(args, 1, len as f64));
            Value::String(substring(a.min(b), a.max(b)))
        }
        "split" => match args.first() {
            None | Some(Value::Undefined) => Value::array(vec![Value::from(s)]),
            Some(separator) => {
                let separator = separator.to_display_string();
                let parts: Vec<Value> = if separator.is_empty() {
                    chars.iter().map(|c| Value::String(c.to_string())).collect()
                } else {
                    s.split(separator.as_str()).map(Value::from).collect()
                };
                let limit = match args.get(1) {
                    None | Some(Value::Undefined) => parts.len(),
                    Some(_) => integer(args, 1, 0.0).max(0.0) as usize,
                };
                Value::array(parts.into_iter().take(limit).collect())
            }
        },
        "replace" => Value::String(s.replacen(&string_arg(args, 0), &string_arg(args, 1), 1)),
        "replaceAll" => Value::String(s.replace(&string_arg(args, 0), &string_arg(args, 1))),
        "repeat" => {
            let count = integer(args, 0, 0.0);
            if count < 0.0 || count.is_infinite() {
                return Some(Err(EvalError::Invalid(format!(
                    "Invalid count value: {}",
                    format_number(count)
                ))));
            }
            if len as f64 * count > MAX_STRING_LENGTH {
                return Some(Err(invalid_string_length()));
            }
            Value::String(s.repeat(count as usize))
        }
        "padStart" | "padEnd" => {
            let target = integer(args, 0, 0.0);
            let fill = match args.get(1) {
                None | Some(Value::Undefined) => " ".to_string(),
                Some(v) => v.to_display_string(),
            };
            if target <= len as f64 || fill.is_empty() {
                Value::String(s.to_string())
            } else if target > MAX_STRING_LENGTH {
                return Some(Err(invalid_string_length()));
            } else {
                let target = target as usize;
                let padding: String = fill.chars().cycle().take(target - len).collect();
                if name == "padStart" {
                    Value::String(padding + s)
                } else {
                    Value::String(s.to_string() + &padding)
                }
            }
        }
        "at" => {
            let position = integer(args, 0, 0.0);
            let index = if position < 0.0 {
                len as f64 + position
            } else {
                position
            };
            if index < 0.0 {
                Value::Undefined
            } else {
                chars
                    .get(index as usize)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default()
            }
        }
        "charAt" => {
            let index = integer(args, 0, 0.0);
            let c = if index < 0.0 {
                None
            } else {
                chars.get(index as usize)
            };
            Value::String(c.map(|c| c.to_string()).unwrap_or_default())
        }
        "concat" => {
            let mut out = s.to_string();
            for arg in args {
                out.push_str(&arg.to_display_string());
            }
            Value::String(out)
        }
        _ => return None,
    };
    Some(Ok(value))
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Outcome {
    let len = items.len();
    let value = match name {
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(v) => v.to_display_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_display_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        "toString" => Value::String(Value::array(items.to_vec()).to_display_string()),
        "includes" => {
            let needle = args.first().cloned().unwrap_or_default();
            Value::Bool(items.iter().any(|item| same_value_zero(item, &needle)))
        }
        "indexOf" => {
            let needle = args.first().cloned().unwrap_or_default();
            let from = relative(integer(args, 1, 0.0), len);
            items[from..]
                .iter()
                .position(|item| item.strict_eq(&needle))
                .map(|i| Value::from(from + i))
                .unwrap_or(Value::Number(-1.0))
        }
        "slice" => {
            let from = relative(integer(args, 0, 0.0), len);
            let to = relative(integer(args, 1, len as f64), len);
            let slice = if from < to { items[from..to].to_vec() } else { Vec::new() };
            Value::array(slice)
        }
        "concat" => {
            let mut out = items.to_vec();
            for arg in args {
                match arg {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::array(out)
        }
        "at" => {
            let position = integer(args, 0, 0.0);
            let index = if position < 0.0 {
                len as f64 + position
            } else {
                position
            };
            if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or_default()
            }
        }
        "reverse" => Value::array(items.iter().rev().cloned().collect()),
        _ => return None,
    };
    Some(Ok(value))
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_eq(b),
    }
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Outcome {
    let value = match name {
        "toFixed" => {
            let digits = integer(args, 0, 0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Some(Err(EvalError::Invalid(
                    "toFixed() digits argument must be between 0 and 100".to_string(),
                )));
            }
            if n.is_finite() {
                Value::String(format!("{:.*}", digits as usize, n))
            } else {
                Value::String(format_number(n))
            }
        }
        "toString" => Value::String(format_number(n)),
        _ => return None,
    };
    Some(Ok(value))
}
