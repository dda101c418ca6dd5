//! Forgiving accessors over the arbitrary JSON tree of a candidate document.
//!
//! Every lookup defaults on a missing key, a `null`, or a value of the wrong
//! shape. Nothing here returns an error.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

/// The raw candidate document exactly as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Walks object keys along `path`. `None` when any step is missing or `null`.
    pub fn value_at(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.0;
        for key in path {
            current = current.as_object()?.get(*key)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// String at `path`, or `""`.
    pub fn str_at(&self, path: &[&str]) -> &str {
        self.value_at(path).and_then(Value::as_str).unwrap_or("")
    }

    /// Scalar at `path` rendered as text. Strings are returned as-is, numbers
    /// and booleans via their JSON form; objects, arrays and absent values give `None`.
    pub fn text_at(&self, path: &[&str]) -> Option<String> {
        self.value_at(path).and_then(scalar_text)
    }

    /// Array at `path`, or an empty slice.
    pub fn array_at(&self, path: &[&str]) -> &[Value] {
        self.value_at(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Single-line JSON text of the whole document, field order and non-ASCII
    /// text preserved. Items are separated by `", "` and keys by `": "`.
    pub fn to_single_line(&self) -> String {
        let mut out = Vec::new();
        let mut ser = Serializer::with_formatter(&mut out, SpacedFormatter);
        // Serializing a `Value` into memory cannot fail: keys are always strings.
        if self.0.serialize(&mut ser).is_err() {
            return String::new();
        }
        String::from_utf8(out).unwrap_or_default()
    }
}

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Renders a scalar JSON value as text; `None` for null, objects and arrays.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a number, accepting numeric strings; anything else is `0.0`.
pub fn number_or_zero(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
