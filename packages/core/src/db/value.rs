//! Tabular Record Model
//!
//! Store-agnostic representation of what a graph query returns: a
//! [`RecordSet`] of ordered [`Row`]s, each row a set of named columns holding
//! a [`Value`]. Statements sent to the store are described by [`Statement`],
//! a query text plus its named parameters.
//!
//! Typed column access goes through [`FromValue`], so a mapper reads like
//! `row.get::<String>("title")?`.

use crate::db::error::MappingError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A single value returned by (or sent to) the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the value's type, used in mapping errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with integers widened the way Cypher arithmetic does
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a store [`Value`] into a Rust type
pub trait FromValue: Sized {
    /// Type name reported when conversion fails
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One returned record: named columns and their values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insertion
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Presence check for a column (a present column may still hold `Null`)
    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Raw value of a column
    pub fn value(&self, column: &str) -> Result<&Value, MappingError> {
        self.columns
            .get(column)
            .ok_or_else(|| MappingError::missing_column(column))
    }

    /// Typed value of a column
    ///
    /// Use `Option<T>` for nullable columns; a `Null` in a non-optional column
    /// is a type mismatch.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, MappingError> {
        let value = self.value(column)?;
        T::from_value(value)
            .ok_or_else(|| MappingError::type_mismatch(column, T::EXPECTED, value.type_name()))
    }

    /// True when every column is `Null`
    ///
    /// This is the shape `collect()` produces for an OPTIONAL MATCH that
    /// matched nothing.
    pub fn is_all_null(&self) -> bool {
        self.columns.values().all(Value::is_null)
    }
}

impl From<BTreeMap<String, Value>> for Row {
    fn from(columns: BTreeMap<String, Value>) -> Self {
        Self { columns }
    }
}

impl TryFrom<&Value> for Row {
    type Error = MappingError;

    /// View a map value (e.g. an element of a collected list) as a row
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(Row::from(map.clone())),
            other => Err(MappingError::type_mismatch(
                "<element>",
                "map",
                other.type_name(),
            )),
        }
    }
}

/// Ordered rows returned by one statement, in store order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    rows: Vec<Row>,
}

impl RecordSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for RecordSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl FromIterator<Row> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Named statement parameters
pub type Params = BTreeMap<String, Value>;

/// A parameterized query: text with `$name` placeholders plus their values
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: Cow<'static, str>,
    params: Params,
}

impl Statement {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            text: text.into(),
            params: Params::new(),
        }
    }

    /// Bind a placeholder value
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Placeholder names referenced in the text, in first-seen order
    pub fn placeholders(&self) -> Vec<&str> {
        let text: &str = &self.text;
        let bytes = text.as_bytes();
        let mut names: Vec<&str> = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start {
                    let name = &text[start..end];
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                i = end.max(start);
            } else {
                i += 1;
            }
        }
        names
    }

    /// Placeholders referenced in the text that have no bound value
    pub fn missing_params(&self) -> Vec<&str> {
        self.placeholders()
            .into_iter()
            .filter(|name| !self.params.contains_key(*name))
            .collect()
    }
}
