// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Typed config values and their `(type_tag, raw)` storage encoding.
//!
//! The `configs` table stores every value as text next to a tag naming the
//! original type:
//!
//! | Tag | Raw text | Value |
//! |-----|----------|-------|
//! | `null` | ignored, may be SQL NULL | `Null` |
//! | `bool` | `true` / `false` | `Bool` |
//! | `int` | decimal integer | `Int` |
//! | `float` | decimal, `NaN`, `Infinity`, `-Infinity` | `Float` |
//! | `str` | the string itself | `String` |
//! | `json` | JSON document | `Array` / `Object` |
//!
//! `json` documents follow the tracking client's writer: bare `NaN`,
//! `Infinity` and `-Infinity` tokens may stand in for numbers, and object
//! keys keep their written order.
//!
//! `decode(tag, encode(v))` yields `v` again for every value.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use thiserror::Error;

use crate::codec::non_finite_sentinel;

/// A deserialized config value.
///
/// Unlike `serde_json::Value` this can hold non-finite floats, which the
/// response codec later renders as sentinel strings.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

/// NaN compares equal to NaN so that decoded values can be checked against
/// their originals.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Json,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
            TypeTag::Json => "json",
        }
    }

    /// Parse a stored tag. Returns `None` for tags this reader doesn't know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "null" | "none" => Some(TypeTag::Null),
            "bool" => Some(TypeTag::Bool),
            "int" => Some(TypeTag::Int),
            "float" => Some(TypeTag::Float),
            "str" => Some(TypeTag::Str),
            "json" => Some(TypeTag::Json),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("missing raw value for type '{0}'")]
    MissingRaw(TypeTag),

    #[error("invalid bool: {0:?}")]
    InvalidBool(String),

    #[error("invalid int {raw:?}: {source}")]
    InvalidInt {
        raw: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid float {raw:?}: {source}")]
    InvalidFloat {
        raw: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Encode a value into its canonical `(tag, raw)` pair.
pub fn encode(value: &Value) -> Result<(TypeTag, String), ValueError> {
    let encoded = match value {
        Value::Null => (TypeTag::Null, "null".to_string()),
        Value::Bool(b) => (TypeTag::Bool, b.to_string()),
        Value::Int(i) => (TypeTag::Int, i.to_string()),
        Value::Float(f) => (TypeTag::Float, format_float(*f)),
        Value::String(s) => (TypeTag::Str, s.clone()),
        Value::Array(_) | Value::Object(_) => (TypeTag::Json, to_json_text(value)?),
    };
    Ok(encoded)
}

/// Decode a stored `(tag, raw)` pair.
pub fn decode(tag: TypeTag, raw: Option<&str>) -> Result<Value, ValueError> {
    if tag == TypeTag::Null {
        return Ok(Value::Null);
    }
    let raw = raw.ok_or(ValueError::MissingRaw(tag))?;

    match tag {
        TypeTag::Null => Ok(Value::Null),
        TypeTag::Bool => parse_bool(raw).map(Value::Bool),
        TypeTag::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|source| ValueError::InvalidInt {
                raw: raw.to_string(),
                source,
            }),
        // f64's parser accepts nan/inf/infinity in any case
        TypeTag::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|source| ValueError::InvalidFloat {
                raw: raw.to_string(),
                source,
            }),
        TypeTag::Str => Ok(Value::String(raw.to_string())),
        TypeTag::Json => parse_json(raw),
    }
}

/// Decode a row as stored, falling back to the raw string when the tag is
/// unknown to this reader.
pub fn decode_tagged(tag: &str, raw: Option<&str>) -> Result<Value, ValueError> {
    match TypeTag::from_tag(tag) {
        Some(tag) => decode(tag, raw),
        None => {
            tracing::debug!(tag, "Unknown config type tag, returning raw value");
            Ok(raw.map_or(Value::Null, |r| Value::String(r.to_string())))
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw.trim() {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        other => Err(ValueError::InvalidBool(other.to_string())),
    }
}

fn format_float(f: f64) -> String {
    match non_finite_sentinel(f) {
        Some(token) => token.to_string(),
        // Debug keeps a decimal point and round-trips exactly
        None => format!("{f:?}"),
    }
}

// --- JSON documents with non-finite tokens ---
//
// serde_json only reads strict JSON. Before parsing, every bare non-finite
// token is rewritten into a string holding a leading NUL plus the token.
// Genuine strings that already start with a NUL (always written `\u0000`,
// JSON has no raw control characters) get one more NUL prepended, so after
// parsing a single leading NUL marks a token and a double one a stuffed
// string.

const NUL_ESCAPE: &str = "\\u0000";
const NUL: char = '\0';

/// Longest first, so `-Infinity` is never split into `-` and `Infinity`.
const NON_FINITE_TOKENS: [(&str, f64); 3] = [
    ("-Infinity", f64::NEG_INFINITY),
    ("Infinity", f64::INFINITY),
    ("NaN", f64::NAN),
];

fn parse_json(raw: &str) -> Result<Value, ValueError> {
    let StoredJson(value) = serde_json::from_str(&quote_non_finite(raw))?;
    Ok(value)
}

/// Rewrite bare non-finite tokens into marked strings, see above.
fn quote_non_finite(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if c == '"' {
            let (literal, tail) = split_string_literal(rest);
            let body = literal.strip_prefix('"').unwrap_or(literal);
            out.push('"');
            if body.starts_with(NUL_ESCAPE) {
                out.push_str(NUL_ESCAPE);
            }
            out.push_str(body);
            rest = tail;
            continue;
        }

        let token = NON_FINITE_TOKENS
            .iter()
            .find_map(|(token, _)| rest.strip_prefix(token).map(|tail| (*token, tail)));
        if let Some((token, tail)) = token {
            out.push('"');
            out.push_str(NUL_ESCAPE);
            out.push_str(token);
            out.push('"');
            rest = tail;
            continue;
        }

        out.push(c);
        rest = rest.split_at(c.len_utf8()).1;
    }
    out
}

/// Split `s`, which starts with `"`, after its closing quote. An unterminated
/// literal takes the rest of the input and is left for the parser to reject.
fn split_string_literal(s: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return s.split_at(i + 1),
            _ => {}
        }
    }
    (s, "")
}

fn unmark_string(s: String) -> Value {
    let Some(rest) = s.strip_prefix(NUL) else {
        return Value::String(s);
    };
    if rest.starts_with(NUL) {
        return Value::String(rest.to_string());
    }
    match NON_FINITE_TOKENS.iter().find(|(token, _)| *token == rest) {
        Some((_, f)) => Value::Float(*f),
        None => Value::String(s),
    }
}

fn unmark_key(key: String) -> String {
    match key.strip_prefix(NUL) {
        Some(rest) if rest.starts_with(NUL) => rest.to_string(),
        _ => key,
    }
}

/// A value parsed from a rewritten `json` payload.
struct StoredJson(Value);

impl<'de> Deserialize<'de> for StoredJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StoredJsonVisitor).map(StoredJson)
    }
}

struct StoredJsonVisitor;

impl<'de> Visitor<'de> for StoredJsonVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(i64::try_from(u).map_or(Value::Float(u as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(unmark_string(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(unmark_string(s))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(StoredJson(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = IndexMap::new();
        // Repeated keys keep their first position and the last value
        while let Some((key, StoredJson(value))) = map.next_entry::<String, StoredJson>()? {
            object.insert(unmark_key(key), value);
        }
        Ok(Value::Object(object))
    }
}

/// JSON text in the tracking client's layout (`", "` and `": "`
/// separators), non-finite floats as bare tokens.
fn to_json_text(value: &Value) -> Result<String, serde_json::Error> {
    let text = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => serde_json::to_string(s)?,
        Value::Array(items) => {
            let items = items
                .iter()
                .map(to_json_text)
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| Ok(format!("{}: {}", serde_json::to_string(k)?, to_json_text(v)?)))
                .collect::<Result<Vec<_>, serde_json::Error>>()?;
            format!("{{{}}}", entries.join(", "))
        }
    };
    Ok(text)
}
