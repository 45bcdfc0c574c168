//! Values and key/value records.

use std::fmt;
use std::sync::Arc;

use strum::{Display, EnumDiscriminants, EnumIter, EnumString};

use crate::command::args::quote_for_command_line;
use crate::types::key::{NKey, Ttl};

/// A value as read from or written to a backend.
///
/// Collection members are kept in the order the backend reported them.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueType))]
#[strum_discriminants(derive(Hash, Display, EnumString, EnumIter))]
#[strum_discriminants(strum(serialize_all = "lowercase"))]
pub enum Value {
    Null,
    String(Vec<u8>),
    Integer(i64),
    Array(Vec<Value>),
    Set(Vec<Vec<u8>>),
    ZSet(Vec<(Vec<u8>, f64)>),
    Hash(Vec<(Vec<u8>, Vec<u8>)>),
}

/// Shared value handle; several layers may hold the same parsed reply.
pub type NValue = Arc<Value>;

impl Value {
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Value::String(bytes.into())
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::from(self)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Raw bytes for engines that only store byte strings.
    ///
    /// Integers are stored as decimal text; collections have no byte form.
    pub fn to_storage_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::String(bytes) => Some(bytes.clone()),
            Value::Integer(value) => Some(value.to_string().into_bytes()),
            _ => None,
        }
    }

    /// Renders the value as command-line arguments separated by one space.
    pub fn to_command_line(&self) -> Vec<u8> {
        let mut parts: Vec<Vec<u8>> = Vec::new();
        match self {
            Value::Null => parts.push(b"\"\"".to_vec()),
            Value::String(bytes) => parts.push(quote_for_command_line(bytes)),
            Value::Integer(value) => parts.push(value.to_string().into_bytes()),
            Value::Array(items) => parts.extend(items.iter().map(Value::to_command_line)),
            Value::Set(members) => parts.extend(members.iter().map(|m| quote_for_command_line(m))),
            Value::ZSet(members) => {
                for (member, score) in members {
                    parts.push(score.to_string().into_bytes());
                    parts.push(quote_for_command_line(member));
                }
            }
            Value::Hash(fields) => {
                for (field, value) in fields {
                    parts.push(quote_for_command_line(field));
                    parts.push(quote_for_command_line(value));
                }
            }
        }
        parts.join(&b' ')
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into_bytes())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("(nil)"),
            Value::String(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Set(members) => {
                let rendered: Vec<_> = members.iter().map(|m| String::from_utf8_lossy(m)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::ZSet(members) => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|(m, score)| format!("{}: {score}", String::from_utf8_lossy(m)))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Hash(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", String::from_utf8_lossy(k), String::from_utf8_lossy(v)))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

/// One stored record: a key and the value observed or written for it.
#[derive(Debug, Clone, PartialEq)]
pub struct NDbKValue {
    key: NKey,
    value: NValue,
}

impl NDbKValue {
    pub fn new(key: impl Into<NKey>, value: impl Into<NValue>) -> Self {
        NDbKValue {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &NKey {
        &self.key
    }

    pub fn value(&self) -> &NValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn value_string(&self) -> String {
        self.value.to_string()
    }

    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.key.set_ttl(ttl);
    }
}
