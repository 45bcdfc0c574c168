//! Output tree produced by command execution.

use std::fmt;

use crate::types::{NValue, Value};

/// One node of a command's output: an optional value plus children.
///
/// The root returned by `execute` carries no value; every executed command
/// appends one child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastoObject {
    value: Option<NValue>,
    delimiter: String,
    children: Vec<FastoObject>,
}

impl FastoObject {
    pub fn root(delimiter: impl Into<String>) -> Self {
        FastoObject {
            value: None,
            delimiter: delimiter.into(),
            children: Vec::new(),
        }
    }

    pub fn with_value(value: impl Into<NValue>, delimiter: impl Into<String>) -> Self {
        FastoObject {
            value: Some(value.into()),
            delimiter: delimiter.into(),
            children: Vec::new(),
        }
    }

    /// Appends a child holding `value` and returns it for nesting.
    pub fn add_value(&mut self, value: impl Into<NValue>) -> &mut FastoObject {
        let child = FastoObject::with_value(value, self.delimiter.clone());
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn add_child(&mut self, child: FastoObject) {
        self.children.push(child);
    }

    pub fn value(&self) -> Option<&NValue> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[FastoObject] {
        &self.children
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Value of the first child, the common shape of a one-command result.
    pub fn first_value(&self) -> Option<&Value> {
        self.children.first().and_then(|c| c.value.as_deref())
    }
}

impl fmt::Display for FastoObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(value) = &self.value {
            write!(f, "{value}")?;
            wrote = true;
        }
        for child in &self.children {
            if wrote {
                f.write_str(&self.delimiter)?;
            }
            write!(f, "{child}")?;
            wrote = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_children_with_delimiter() {
        let mut root = FastoObject::root("\n");
        root.add_value(Value::from("OK"));
        root.add_value(Value::from(2));
        assert_eq!(root.to_string(), "OK\n2");
        assert_eq!(root.first_value(), Some(&Value::from("OK")));
    }
}
