//! Tool handlers module.
//!
//! A handler receives the validated, coerced [`Arguments`] of one call and
//! produces a JSON payload or a [`ToolError`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use super::error::{ToolError, Violation};
use super::value::Value;

/// Trait implemented by every tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with arguments that already passed validation.
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError>;
}

/// Serialize a tool's structured result into the success payload.
pub fn payload<T: Serialize>(result: &T) -> Result<serde_json::Value, ToolError> {
    serde_json::to_value(result)
        .map_err(|e| ToolError::internal(format!("failed to serialize result: {e}")))
}

/// Validated arguments of a single tool call.
///
/// Produced by the validator, so the accessors only fail when a handler asks
/// for a type that contradicts its own schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.opt_str(name)?
            .ok_or_else(|| ToolError::validation(name, Violation::Missing))
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, ToolError> {
        self.typed(name, "string", Value::as_str)
    }

    pub fn opt_i64(&self, name: &str) -> Result<Option<i64>, ToolError> {
        self.typed(name, "integer", Value::as_i64)
    }

    pub fn opt_f64(&self, name: &str) -> Result<Option<f64>, ToolError> {
        self.typed(name, "number", Value::as_f64)
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, ToolError> {
        self.typed(name, "boolean", Value::as_bool)
    }

    pub fn opt_list(&self, name: &str) -> Result<Option<&[Value]>, ToolError> {
        self.typed(name, "array", Value::as_list)
    }

    pub fn list(&self, name: &str) -> Result<&[Value], ToolError> {
        self.opt_list(name)?
            .ok_or_else(|| ToolError::validation(name, Violation::Missing))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &str,
        extract: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, ToolError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                ToolError::validation(
                    name,
                    Violation::WrongType {
                        expected: expected.to_string(),
                        found: value.kind().to_string(),
                    },
                )
            }),
        }
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
