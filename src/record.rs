//! Record model and payload helpers
//!
//! A record is a flat JSON object. Key order is preserved end to end
//! (`serde_json` is built with `preserve_order`).

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

use crate::error::{PiiError, Result};

/// One unit of input data: field name to value
pub type Record = Map<String, Value>;

/// Key of the marker record emitted for unparseable payloads
pub const ERROR_KEY: &str = "error";

/// Message carried by the marker record
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid JSON format";

/// Parse an embedded payload into a record.
///
/// Payloads exported through spreadsheet tools often keep their quotes
/// doubled (`""name""`). The raw text is tried first; on failure the
/// doubled quotes are collapsed and parsing is retried once.
pub fn parse_payload(raw: &str) -> Result<Record> {
    match parse_object(raw) {
        Ok(record) => Ok(record),
        Err(first) if raw.contains("\"\"") => {
            parse_object(&raw.replace("\"\"", "\"")).map_err(|_| first)
        }
        Err(e) => Err(e),
    }
}

fn parse_object(raw: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(PiiError::InvalidPayload(format!(
            "payload must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Record emitted in place of an unparseable payload
pub fn error_record() -> Record {
    let mut record = Record::new();
    record.insert(
        ERROR_KEY.to_string(),
        Value::String(INVALID_PAYLOAD_MESSAGE.to_string()),
    );
    record
}

/// Whether a value counts as present.
///
/// Null, `false`, zero, and empty strings/arrays/objects are absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a value as handed to a redaction transform.
///
/// Strings pass through verbatim. Scalars use the `True`/`False`/`None`
/// spellings and containers use a single-quoted repr.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => repr_str(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", repr(&Value::String(k.clone())), repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Quoted, escaped form of a string inside a container.
///
/// Single quotes unless the text holds a `'` and no `"`. Control and
/// non-space whitespace characters are written as escapes, so they never
/// split a value into tokens.
fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() || (c.is_whitespace() && c != ' ') => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Split text into whitespace-separated tokens.
///
/// Besides Unicode whitespace, the information separators U+001C..U+001F
/// also separate tokens.
pub fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
        .filter(|token| !token.is_empty())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize a record with `", "` / `": "` separators and ASCII-only output
pub fn to_json_string(record: &Record) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    record.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| PiiError::InvalidPayload(format!("non-UTF-8 output: {}", e)))
}

/// Single-line formatter with spaced separators that escapes non-ASCII
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
