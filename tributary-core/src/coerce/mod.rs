//! Schema-driven coercion of raw response fields into typed SQL values.
//!
//! The schema comes from an OpenAPI document extended with `pattern` and
//! `maxLength` conventions. Rules are ordered and first-match wins; the
//! order is part of the contract (a bounded string with a date `pattern`
//! is a bounded string, not a date).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::address::{resolve_address, Address, AddressError, AddressKey};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SchemaProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxLength")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaItems>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SchemaItems {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Per-table coercion contract: property name to schema fragment.
pub type TableSchema = BTreeMap<String, SchemaProperty>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    /// `VARCHAR(n)`; `None` renders as `VARCHAR(MAX)`.
    Varchar(Option<u32>),
    DateTime,
    Int,
    BigInt,
    Float,
    Bit,
    /// Opaque passthrough label taken verbatim from the schema `format`,
    /// e.g. `money`.
    Other(String),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Varchar(Some(n)) => write!(f, "VARCHAR({n})"),
            SqlType::Varchar(None) => write!(f, "VARCHAR(MAX)"),
            SqlType::DateTime => write!(f, "DATETIME"),
            SqlType::Int => write!(f, "INT"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Float => write!(f, "FLOAT"),
            SqlType::Bit => write!(f, "BIT"),
            SqlType::Other(label) => write!(f, "{label}"),
        }
    }
}

/// A typed SQL value. `Null` is an explicit sentinel so an absent raw value
/// still carries the schema-derived type on the enclosing [`SqlItem`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Bit(bool),
    Text(String),
    DateTime(NaiveDateTime),
    /// Passthrough value for opaque `format` labels.
    Raw(Value),
}

impl fmt::Display for SqlValue {
    /// Renders as a SQL literal: strings become quoted `N'...'` Unicode
    /// literals with embedded quotes doubled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Bit(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            SqlValue::Text(s) => write!(f, "N'{}'", s.replace('\'', "''")),
            SqlValue::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            SqlValue::Raw(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlItem {
    pub value: SqlValue,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error("property '{property}' is not present in the schema")]
    PropertyNotInSchema { property: String },

    #[error("schema for '{property}' is not coercible (type {kind:?}, format {format:?}); raw value: {raw}")]
    UnhandledSchemaType {
        property: String,
        kind: Option<String>,
        format: Option<String>,
        raw: Value,
    },

    #[error("value for '{property}' does not match its schema (expected {expected}): {raw}")]
    ValueMismatch {
        property: String,
        expected: &'static str,
        raw: Value,
    },

    #[error("cannot parse '{property}' as a date with pattern '{pattern}': {raw}")]
    DateParse {
        property: String,
        pattern: String,
        raw: Value,
    },

    #[error("record payload is not a JSON object: {raw}")]
    NotARecord { raw: Value },
}

/// Which ordered coercion rule a schema fragment matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    ScalarArray,
    BoundedString,
    PatternDate,
    Rfc3339,
    PlainString,
    Boolean,
    Int32,
    Int64,
    FloatDefault,
    Passthrough,
}

fn match_rule(prop: &SchemaProperty) -> Option<Rule> {
    let kind = prop.kind.as_deref();
    let format = prop.format.as_deref();
    let items_kind = prop.items.as_ref().and_then(|i| i.kind.as_deref());

    if kind == Some("array") && matches!(items_kind, Some("number" | "string")) {
        return Some(Rule::ScalarArray);
    }
    if kind == Some("string") && prop.max_length.is_some() {
        return Some(Rule::BoundedString);
    }
    if prop.pattern.is_some() && format.is_some_and(|f| f.contains("date")) {
        return Some(Rule::PatternDate);
    }
    if format == Some("date-time") {
        return Some(Rule::Rfc3339);
    }
    if kind == Some("string") {
        return Some(Rule::PlainString);
    }
    if kind == Some("boolean") {
        return Some(Rule::Boolean);
    }
    if kind == Some("number") {
        return Some(match format {
            Some("int32") => Rule::Int32,
            Some("int64") => Rule::Int64,
            None => Rule::FloatDefault,
            Some(_) => Rule::Passthrough,
        });
    }
    None
}

fn rule_sql_type(rule: Rule, prop: &SchemaProperty) -> SqlType {
    match rule {
        Rule::ScalarArray | Rule::PlainString => SqlType::Varchar(None),
        Rule::BoundedString => SqlType::Varchar(prop.max_length),
        Rule::PatternDate | Rule::Rfc3339 => SqlType::DateTime,
        Rule::Boolean => SqlType::Bit,
        Rule::Int32 => SqlType::Int,
        Rule::Int64 => SqlType::BigInt,
        Rule::FloatDefault => SqlType::Float,
        // match_rule only yields Passthrough when a format is present.
        Rule::Passthrough => SqlType::Other(prop.format.clone().unwrap_or_default()),
    }
}

/// Coerces a single raw field into a typed SQL value per the schema.
///
/// A `null` raw value coerces to the `Null` sentinel typed by whichever rule
/// the schema matched, never to an error.
pub fn coerce(schema: &TableSchema, property: &str, raw: &Value) -> Result<SqlItem, CoerceError> {
    let prop = schema
        .get(property)
        .ok_or_else(|| CoerceError::PropertyNotInSchema {
            property: property.to_string(),
        })?;

    let rule = match_rule(prop).ok_or_else(|| CoerceError::UnhandledSchemaType {
        property: property.to_string(),
        kind: prop.kind.clone(),
        format: prop.format.clone(),
        raw: raw.clone(),
    })?;
    let sql_type = rule_sql_type(rule, prop);

    if raw.is_null() {
        return Ok(SqlItem {
            value: SqlValue::Null,
            sql_type,
        });
    }

    let value = apply_rule(rule, prop, property, raw)?;
    Ok(SqlItem { value, sql_type })
}

fn apply_rule(
    rule: Rule,
    prop: &SchemaProperty,
    property: &str,
    raw: &Value,
) -> Result<SqlValue, CoerceError> {
    match rule {
        Rule::ScalarArray => match raw {
            Value::Array(_) => Ok(SqlValue::Text(raw.to_string())),
            _ => Err(mismatch(property, "array", raw)),
        },
        Rule::BoundedString | Rule::PlainString => coerce_text(property, raw),
        Rule::PatternDate => {
            // match_rule only yields PatternDate when a pattern is present.
            let pattern = prop.pattern.as_deref().unwrap_or_default();
            let s = raw.as_str().ok_or_else(|| mismatch(property, "date string", raw))?;
            parse_with_pattern(s, pattern).map(SqlValue::DateTime).ok_or_else(|| {
                CoerceError::DateParse {
                    property: property.to_string(),
                    pattern: pattern.to_string(),
                    raw: raw.clone(),
                }
            })
        }
        Rule::Rfc3339 => {
            let s = raw.as_str().ok_or_else(|| mismatch(property, "date-time string", raw))?;
            parse_rfc3339_lenient(s).map(SqlValue::DateTime).ok_or_else(|| {
                CoerceError::DateParse {
                    property: property.to_string(),
                    pattern: "RFC 3339".to_string(),
                    raw: raw.clone(),
                }
            })
        }
        Rule::Boolean => coerce_bit(property, raw),
        Rule::Int32 | Rule::Int64 => coerce_integer(property, raw).map(SqlValue::Int),
        Rule::FloatDefault => coerce_float(property, raw).map(SqlValue::Float),
        Rule::Passthrough => Ok(SqlValue::Raw(raw.clone())),
    }
}

fn mismatch(property: &str, expected: &'static str, raw: &Value) -> CoerceError {
    CoerceError::ValueMismatch {
        property: property.to_string(),
        expected,
        raw: raw.clone(),
    }
}

fn coerce_text(property: &str, raw: &Value) -> Result<SqlValue, CoerceError> {
    match raw {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        // APIs routinely hand back bare numbers/booleans for string-typed
        // fields; stringify instead of rejecting.
        Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
        Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
        _ => Err(mismatch(property, "string", raw)),
    }
}

fn coerce_bit(property: &str, raw: &Value) -> Result<SqlValue, CoerceError> {
    match raw {
        Value::Bool(b) => Ok(SqlValue::Bit(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(SqlValue::Bit(false)),
            Some(1) => Ok(SqlValue::Bit(true)),
            _ => Err(mismatch(property, "boolean", raw)),
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Ok(SqlValue::Bit(true)),
            "false" | "0" => Ok(SqlValue::Bit(false)),
            _ => Err(mismatch(property, "boolean", raw)),
        },
        _ => Err(mismatch(property, "boolean", raw)),
    }
}

fn coerce_integer(property: &str, raw: &Value) -> Result<i64, CoerceError> {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            // Integral floats (e.g. 3.0 from a JSON source) still count,
            // but only inside the range an f64 represents exactly; beyond
            // 2^53 the cast would fabricate digits or saturate.
            const EXACT_INT_BOUND: f64 = 9_007_199_254_740_992.0; // 2^53
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= EXACT_INT_BOUND => Ok(f as i64),
                _ => Err(mismatch(property, "integer", raw)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| mismatch(property, "integer", raw)),
        _ => Err(mismatch(property, "integer", raw)),
    }
}

fn coerce_float(property: &str, raw: &Value) -> Result<f64, CoerceError> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(property, "number", raw)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| mismatch(property, "number", raw)),
        _ => Err(mismatch(property, "number", raw)),
    }
}

/// strftime-style pattern parse; a date-only pattern yields midnight.
fn parse_with_pattern(s: &str, pattern: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, pattern)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Permissive RFC 3339: a strict parse first, then common offset-less and
/// date-only shapes seen in the wild.
fn parse_rfc3339_lenient(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerces every field of a record payload against the table schema.
pub fn coerce_record(
    schema: &TableSchema,
    payload: &Value,
) -> Result<BTreeMap<String, SqlItem>, CoerceError> {
    let map = payload.as_object().ok_or_else(|| CoerceError::NotARecord {
        raw: payload.clone(),
    })?;
    map.iter()
        .map(|(name, raw)| coerce(schema, name, raw).map(|item| (name.clone(), item)))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("schema properties for '{path}' do not deserialize: {source}")]
    Shape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Pulls the per-table coercion schema for `path` out of a full OpenAPI
/// document: the `properties` of the 200 JSON response of the path's GET.
pub fn response_schema(openapi: &Value, path: &str) -> Result<TableSchema, SchemaError> {
    let address = Address(
        [
            "paths", path, "get", "responses", "200", "content", "application/json", "schema",
            "properties",
        ]
        .into_iter()
        .map(|k| AddressKey::Key(k.to_string()))
        .collect(),
    );
    let properties = resolve_address(openapi, &address)?;
    serde_json::from_value(properties.clone()).map_err(|source| SchemaError::Shape {
        path: path.to_string(),
        source,
    })
}
