//! Values read from and written into shared containers.
//!
//! [`Value`] is what reads return. Scalars compare by value; container
//! variants compare by identity, so two maps with equal content are still
//! different values unless they are the same shared container.
//!
//! [`Input`] is what writes accept. Nested [`Input::Map`], [`Input::List`]
//! and [`Input::Text`] become fresh shared containers when written.

use std::{collections::BTreeMap, fmt};

use yrs::{Any, In, Out, ReadTxn, TextPrelim};

use super::{CRDTError, Container, Doc, ListRef, MapRef, TextRef};

/// A value stored in a shared container.
#[derive(Debug, Clone)]
pub enum Value {
    // Leaf values
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// A structured leaf written as one opaque value by a peer
    Json(serde_json::Value),

    // Shared containers
    Map(MapRef),
    List(ListRef),
    Text(TextRef),
}

impl Value {
    /// Returns true if this is a shared container
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::List(_) | Value::Text(_))
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Json(_) => "json",
            Value::Map(_) => "map",
            Value::List(_) => "list",
            Value::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRef> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The shared container behind this value, if it is one.
    pub fn as_container(&self) -> Option<Container> {
        match self {
            Value::Map(map) => Some(Container::Map(map.clone())),
            Value::List(list) => Some(Container::List(list.clone())),
            Value::Text(text) => Some(Container::Text(text.clone())),
            _ => None,
        }
    }

    /// Snapshot of this value and everything nested in it.
    pub fn to_json<T: ReadTxn>(&self, txn: &T) -> serde_json::Value {
        match self {
            Value::Map(map) => map.to_json(txn),
            Value::List(list) => list.to_json(txn),
            Value::Text(text) => serde_json::Value::String(text.get_string(txn)),
            leaf => leaf.leaf_json(),
        }
    }

    /// Like [`Value::to_json`], reading containers in a transaction of their
    /// own.
    pub fn snapshot(&self) -> Result<serde_json::Value, CRDTError> {
        match self.as_container() {
            Some(container) => container.snapshot(),
            None => Ok(self.leaf_json()),
        }
    }

    fn leaf_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Json(json) => json.clone(),
            Value::Null | Value::Map(_) | Value::List(_) | Value::Text(_) => serde_json::Value::Null,
        }
    }

    pub(crate) fn from_out(out: Out, doc: &Doc) -> Self {
        match out {
            Out::Any(any) => Value::from(any),
            Out::YMap(map) => Value::Map(MapRef::new(doc.clone(), map)),
            Out::YArray(list) => Value::List(ListRef::new(doc.clone(), list)),
            Out::YText(text) => Value::Text(TextRef::new(doc.clone(), text)),
            // XML, sub-documents and roots of unknown kind
            _ => Value::Null,
        }
    }
}

impl From<MapRef> for Value {
    fn from(map: MapRef) -> Self {
        Value::Map(map)
    }
}

impl From<ListRef> for Value {
    fn from(list: ListRef) -> Self {
        Value::List(list)
    }
}

impl From<TextRef> for Value {
    fn from(text: TextRef) -> Self {
        Value::Text(text)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Ok(json) => write!(f, "{json}"),
            // a write transaction is open
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

/// Plain values written by any peer. Integers keep their integer encoding.
impl From<Any> for Value {
    fn from(any: Any) -> Self {
        match any {
            Any::Null | Any::Undefined => Value::Null,
            Any::Bool(b) => Value::Bool(b),
            Any::BigInt(n) => Value::Int(n),
            Any::Number(n) => Value::Float(n),
            Any::String(s) => Value::String(s.to_string()),
            other => serde_json::to_value(&other)
                .map(Value::Json)
                .unwrap_or(Value::Null),
        }
    }
}

/// A value about to be written into a shared container.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Becomes a new key-map container
    Map(BTreeMap<String, Input>),
    /// Becomes a new ordered-list container
    List(Vec<Input>),
    /// Becomes a new rich-text container
    Text(String),
}

impl Input {
    /// Builds a nested map input.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Input>,
    {
        Input::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a nested list input.
    pub fn list<V: Into<Input>>(items: impl IntoIterator<Item = V>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }

    /// Parses a JSON document. Objects become maps and arrays become lists.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str::<serde_json::Value>(json)?.into())
    }

    /// Builds a rich-text input with unformatted content.
    pub fn text(content: impl Into<String>) -> Self {
        Input::Text(content.into())
    }

    /// The `yrs` form of this input. Nested maps, lists and texts are
    /// integrated as new containers together with their content.
    pub(crate) fn into_prelim(self) -> In {
        match self {
            Input::Null => In::Any(Any::Null),
            Input::Bool(b) => In::Any(Any::Bool(b)),
            Input::Int(n) => In::Any(Any::BigInt(n)),
            Input::Float(n) => In::Any(Any::Number(n)),
            Input::String(s) => In::Any(Any::String(s.into())),
            Input::Map(entries) => In::Map(
                entries
                    .into_iter()
                    .map(|(key, input)| (key, input.into_prelim()))
                    .collect(),
            ),
            Input::List(items) => In::Array(items.into_iter().map(Input::into_prelim).collect()),
            Input::Text(content) => In::from(TextPrelim::new(content)),
        }
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Bool(b)
    }
}

impl From<i64> for Input {
    fn from(n: i64) -> Self {
        Input::Int(n)
    }
}

impl From<i32> for Input {
    fn from(n: i32) -> Self {
        Input::Int(n as i64)
    }
}

impl From<u32> for Input {
    fn from(n: u32) -> Self {
        Input::Int(n as i64)
    }
}

impl From<f64> for Input {
    fn from(n: f64) -> Self {
        Input::Float(n)
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::String(s.to_string())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::String(s)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::list(items)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Input::Null)
    }
}

/// JSON objects become maps and arrays become lists; strings stay scalars.
impl From<serde_json::Value> for Input {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Input::Null,
            serde_json::Value::Bool(b) => Input::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Input::Int(i),
                None => Input::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Input::String(s),
            serde_json::Value::Array(items) => Input::list(items),
            serde_json::Value::Object(entries) => Input::map(entries),
        }
    }
}
