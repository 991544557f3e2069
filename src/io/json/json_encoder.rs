use std::fmt::Write;

use crate::value::Value;

/// A JSON encoder of [`Value`]s.
///
/// Differences from strict JSON:
/// - non-finite floats are encoded as `NaN`, `Infinity` and `-Infinity`, and
/// - a one-dimensional list is always encoded on a single line, even if an indent is set.
///
/// Lists of two or more dimensions and maps are encoded with one item per line if an indent is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder {
    indent: Option<usize>,
    sort_keys: bool,
}

impl JsonEncoder {
    /// Create a new encoder.
    ///
    /// If `indent` is [`None`], the encoding is a single line with `, ` separated items.
    /// If `sort_keys` is true, map entries are encoded in key order rather than insertion order.
    #[must_use]
    pub fn new(indent: Option<usize>, sort_keys: bool) -> Self {
        Self { indent, sort_keys }
    }

    /// Encode `value`.
    #[must_use]
    pub fn encode(&self, value: &Value) -> String {
        let mut out = String::new();
        self.encode_value(&mut out, value, 0);
        out
    }

    fn item_separator(&self) -> &'static str {
        if self.indent.is_some() {
            ","
        } else {
            ", "
        }
    }

    fn newline(&self, out: &mut String, level: usize) {
        if let Some(indent) = self.indent {
            out.push('\n');
            out.extend(std::iter::repeat(' ').take(indent * level));
        }
    }

    fn encode_value(&self, out: &mut String, value: &Value, level: usize) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
            Value::Int(value) => {
                let _ = write!(out, "{value}");
            }
            Value::UInt(value) => {
                let _ = write!(out, "{value}");
            }
            Value::Float(value) => encode_float(out, *value),
            Value::String(value) => encode_str(out, value),
            Value::List(items) => self.encode_list(out, items, level),
            Value::Map(entries) => {
                let mut entries: Vec<_> = entries.iter().collect();
                if self.sort_keys {
                    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                }
                self.encode_map(out, &entries, level);
            }
        }
    }

    fn encode_list(&self, out: &mut String, items: &[Value], level: usize) {
        if items.is_empty() {
            out.push_str("[]");
            return;
        }
        let inline = self.indent.is_none() || !matches!(items.first(), Some(Value::List(_)));
        out.push('[');
        let level = if inline { level } else { level + 1 };
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(self.item_separator());
            }
            if !inline {
                self.newline(out, level);
            }
            self.encode_value(out, item, level);
        }
        if !inline {
            self.newline(out, level - 1);
        }
        out.push(']');
    }

    fn encode_map(&self, out: &mut String, entries: &[(&String, &Value)], level: usize) {
        if entries.is_empty() {
            out.push_str("{}");
            return;
        }
        out.push('{');
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(self.item_separator());
            }
            self.newline(out, level + 1);
            encode_str(out, key);
            out.push_str(": ");
            self.encode_value(out, value, level + 1);
        }
        self.newline(out, level);
        out.push('}');
    }
}

fn encode_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        // debug formatting keeps a fractional part or exponent so the value reads back as a float
        let _ = write!(out, "{value:?}");
    }
}

fn encode_str(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
