//! Values carried by managed objects and variable bindings

use std::fmt;

use super::oid::Oid;

/// A typed scalar value
///
/// `Null` is what a manager puts in a read request; it is never stored and
/// writing it is always a type mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Null,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "\"{text}\""),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// Per-item result of a read: a value or one of the protocol exceptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Value(Value),
    NoSuchObject,
    EndOfMibView,
}

/// Identifier paired with its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: VarValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: VarValue) -> Self {
        Self { oid, value }
    }
}
