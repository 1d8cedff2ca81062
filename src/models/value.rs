// src/models/value.rs

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A user-defined flag value type.
///
/// `set` receives every raw occurrence of the flag, `describe` renders the
/// current value for help output.
pub trait Generic: fmt::Debug {
    fn set(&mut self, raw: &str) -> Result<(), String>;
    fn describe(&self) -> String;
    fn clone_box(&self) -> Box<dyn Generic>;
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Generic> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The parsed value cell of one flag. The variant fixes the flag's type.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    Float64(f64),
    Duration(Duration),
    String(String),
    StringSlice(Vec<String>),
    IntSlice(Vec<isize>),
    Int64Slice(Vec<i64>),
    Float64Slice(Vec<f64>),
    StringMap(BTreeMap<String, String>),
    Generic(Box<dyn Generic>),
    /// Log level driven by the verbosity flag family.
    Verbosity(u8),
}

impl Value {
    /// Whether the flag stands alone on the command line, never consuming
    /// the following token.
    pub fn is_bool_like(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Applies one raw occurrence. `first` is true for the first explicit
    /// occurrence, which drops any default carried by accumulating kinds.
    pub fn set(&mut self, raw: &str, first: bool) -> Result<(), String> {
        match self {
            Value::Bool(b) => *b = parse_bool(raw)?,
            Value::Int(i) => *i = isize::try_from(parse_int(raw)?).map_err(|e| e.to_string())?,
            Value::Int64(i) => *i = parse_int(raw)?,
            Value::Uint(u) => *u = usize::try_from(parse_uint(raw)?).map_err(|e| e.to_string())?,
            Value::Uint64(u) => *u = parse_uint(raw)?,
            Value::Float64(f) => *f = raw.parse::<f64>().map_err(|e| e.to_string())?,
            Value::Duration(d) => *d = parse_duration(raw)?,
            Value::String(s) => *s = raw.to_string(),
            Value::StringSlice(v) => {
                if first {
                    v.clear();
                }
                v.push(raw.to_string());
            }
            Value::IntSlice(v) => {
                let parsed = isize::try_from(parse_int(raw)?).map_err(|e| e.to_string())?;
                if first {
                    v.clear();
                }
                v.push(parsed);
            }
            Value::Int64Slice(v) => {
                let parsed = parse_int(raw)?;
                if first {
                    v.clear();
                }
                v.push(parsed);
            }
            Value::Float64Slice(v) => {
                let parsed = raw.parse::<f64>().map_err(|e| e.to_string())?;
                if first {
                    v.clear();
                }
                v.push(parsed);
            }
            Value::StringMap(m) => {
                let (key, value) = raw
                    .split_once('=')
                    .ok_or_else(|| "please use key=value format".to_string())?;
                if first {
                    m.clear();
                }
                m.insert(key.trim().to_string(), value.trim().to_string());
            }
            Value::Generic(g) => g.set(raw)?,
            Value::Verbosity(level) => {
                *level = raw
                    .trim()
                    .parse::<u8>()
                    .map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }

    /// Human readable rendering used for defaults in help output.
    pub fn describe(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Int64(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            Value::Uint64(u) => u.to_string(),
            Value::Float64(f) => f.to_string(),
            Value::Duration(d) => format!("{:?}", d),
            Value::String(s) if s.is_empty() => String::new(),
            Value::String(s) => format!("{:?}", s),
            Value::StringSlice(v) => v
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| format!("{:?}", s))
                .collect::<Vec<_>>()
                .join(", "),
            Value::IntSlice(v) => join_display(v),
            Value::Int64Slice(v) => join_display(v),
            Value::Float64Slice(v) => join_display(v),
            Value::StringMap(m) => m
                .iter()
                .map(|(k, v)| format!("\"{}={}\"", k, v))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Generic(g) => g.describe(),
            Value::Verbosity(level) => level.to_string(),
        }
    }

    /// Placeholder shown after the flag name in help output, if it takes one.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Value::Bool(_) | Value::Verbosity(_) => None,
            Value::StringMap(_) => Some("key=value"),
            _ => Some("value"),
        }
    }

    // --- Typed views; every one of them degrades to `None` ---

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => i64::try_from(*i).ok(),
            Value::Int64(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            Value::Uint64(u) => i64::try_from(*u).ok(),
            Value::Verbosity(level) => Some(i64::from(*level)),
            Value::String(s) => parse_int(s).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Int64(i) => u64::try_from(*i).ok(),
            Value::Uint(u) => u64::try_from(*u).ok(),
            Value::Uint64(u) => Some(*u),
            Value::Verbosity(level) => Some(u64::from(*level)),
            Value::String(s) => parse_uint(s).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::String(s) => s.parse().ok(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(d) => Some(*d),
            Value::String(s) => parse_duration(s).ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Duration(d) => format!("{:?}", d),
            Value::StringSlice(v) => format!("[{}]", v.join(" ")),
            other => other.describe(),
        }
    }
}

fn join_display<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accepts the boolean spellings `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("parse error".to_string()),
    }
}

/// Parses a signed integer with optional base prefix (`0x`, `0o`, `0b`, or a
/// leading `0` for octal) and `_` separators.
pub fn parse_int(raw: &str) -> Result<i64, String> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let magnitude = parse_uint(digits)?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
            .ok_or_else(|| "value out of range".to_string())
    } else {
        i64::try_from(magnitude).map_err(|_| "value out of range".to_string())
    }
}

/// Unsigned counterpart of [`parse_int`].
pub fn parse_uint(raw: &str) -> Result<u64, String> {
    let lower = raw.to_ascii_lowercase();
    let (radix, body, prefixed) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest, true)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..], true)
    } else {
        (10, lower.as_str(), false)
    };
    if body.is_empty() || body.starts_with('_') && !prefixed || body.ends_with('_') || body.contains("__") {
        return Err("invalid syntax".to_string());
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return Err("invalid syntax".to_string());
    }
    u64::from_str_radix(&cleaned, radix).map_err(|e| e.to_string())
}

/// Parses durations such as `300ms`, `1.5h` or `2h45m`. Valid units are
/// `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is accepted.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration {:?}", raw);
    let s = raw.strip_prefix('+').unwrap_or(raw);
    if s.starts_with('-') {
        return Err(format!("negative duration {:?}", raw));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", raw))?;
        if number_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1f64,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, raw)),
        };
        rest = &rest[unit_len..];
        total += number * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total.round() as u64))
}
