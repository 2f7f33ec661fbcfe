//! Request validation against a tool's parameter schema.
//!
//! Validation runs before any handler is invoked, so a rejected request never
//! reaches a backend.

use std::collections::BTreeMap;

use super::error::{ToolError, Violation};
use super::handlers::Arguments;
use super::registry::ToolDefinition;
use super::schema::{ParamSpec, ParamType};
use super::value::Value;

/// Validate raw arguments against a definition and return the coerced map.
///
/// Rules:
/// - every required parameter must be present and non-null;
/// - arguments the tool does not declare are rejected;
/// - types must match, with integer to number widening and integral floats
///   narrowing to integers;
/// - optional parameters passed as `null` are dropped.
pub fn validate(
    arguments: BTreeMap<String, Value>,
    definition: &ToolDefinition,
) -> Result<Arguments, ToolError> {
    let params = definition.params();

    if let Some(name) = arguments
        .keys()
        .find(|name| !params.iter().any(|p| p.name == name.as_str()))
    {
        return Err(ToolError::validation(name.clone(), Violation::Unexpected));
    }

    let mut arguments = arguments;
    let mut coerced = BTreeMap::new();

    for param in params {
        match arguments.remove(param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::validation(param.name, Violation::Missing));
                }
            }
            Some(value) => {
                let value = coerce(param, value)?;
                coerced.insert(param.name.to_string(), value);
            }
        }
    }

    Ok(Arguments::new(coerced))
}

fn coerce(param: &ParamSpec, value: Value) -> Result<Value, ToolError> {
    let value = match (param.ty, value) {
        (ParamType::Any, value) => value,
        (ParamType::String, value @ Value::String(_)) => value,
        (ParamType::Integer, value @ Value::Integer(_)) => value,
        (ParamType::Integer, Value::Float(f)) if is_integral(f) => Value::Integer(f as i64),
        (ParamType::Number, Value::Integer(i)) => Value::Float(i as f64),
        (ParamType::Number, value @ Value::Float(_)) => value,
        (ParamType::Boolean, value @ Value::Bool(_)) => value,
        (ParamType::Binary, value @ Value::Binary(_)) => value,
        (ParamType::Array, value @ Value::List(_)) => value,
        (ParamType::Object, value @ Value::Map(_)) => value,
        (ParamType::StringArray, Value::List(items)) => {
            if let Some(bad) = items.iter().find(|v| v.as_str().is_none()) {
                return Err(wrong_type(param, bad));
            }
            Value::List(items)
        }
        (ParamType::NumberArray, Value::List(items)) => {
            let mut numbers = Vec::with_capacity(items.len());
            for item in &items {
                match item.as_f64() {
                    Some(n) => numbers.push(Value::Float(n)),
                    None => return Err(wrong_type(param, item)),
                }
            }
            Value::List(numbers)
        }
        (_, value) => return Err(wrong_type(param, &value)),
    };

    if let (Some(allowed), Some(s)) = (param.allowed, value.as_str()) {
        if !allowed.contains(&s) {
            return Err(ToolError::validation(
                param.name,
                Violation::WrongType {
                    expected: format!("one of {}", allowed.join(", ")),
                    found: format!("'{s}'"),
                },
            ));
        }
    }

    Ok(value)
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
}

fn wrong_type(param: &ParamSpec, found: &Value) -> ToolError {
    ToolError::validation(
        param.name,
        Violation::WrongType {
            expected: param.ty.name().to_string(),
            found: found.kind().to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handlers::ToolHandler;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopTool;

    #[async_trait]
    impl ToolHandler for NoopTool {
        async fn call(&self, _args: Arguments) -> Result<serde_json::Value, ToolError> {
            Ok(serde_json::Value::Null)
        }
    }

    fn definition() -> ToolDefinition {
        ToolDefinition::new("list-objects", "test", Arc::new(NoopTool))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket"))
            .param(ParamSpec::optional("max_keys", ParamType::Integer, "Limit"))
            .param(ParamSpec::optional("ratio", ParamType::Number, "Ratio"))
            .param(ParamSpec::optional("position", ParamType::NumberArray, "Point"))
            .param(
                ParamSpec::optional("mode", ParamType::String, "Mode").one_of(&["Car", "Walking"]),
            )
    }

    fn args(json: serde_json::Value) -> BTreeMap<String, Value> {
        match Value::from_json(json) {
            Value::Map(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn violation_of(err: ToolError) -> (String, Violation) {
        match err {
            ToolError::Validation {
                parameter,
                violation,
            } => (parameter, violation),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_arguments_pass() {
        let validated = validate(
            args(serde_json::json!({ "bucket": "b", "max_keys": 10 })),
            &definition(),
        )
        .unwrap();
        assert_eq!(validated.str("bucket").unwrap(), "b");
        assert_eq!(validated.opt_i64("max_keys").unwrap(), Some(10));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = validate(args(serde_json::json!({ "max_keys": 10 })), &definition()).unwrap_err();
        assert_eq!(violation_of(err), ("bucket".to_string(), Violation::Missing));
    }

    #[test]
    fn test_null_required_parameter_counts_as_missing() {
        let err = validate(args(serde_json::json!({ "bucket": null })), &definition()).unwrap_err();
        assert_eq!(violation_of(err).1, Violation::Missing);
    }

    #[test]
    fn test_unexpected_parameter_rejected() {
        let err = validate(
            args(serde_json::json!({ "bucket": "b", "bucket_name": "b" })),
            &definition(),
        )
        .unwrap_err();
        assert_eq!(
            violation_of(err),
            ("bucket_name".to_string(), Violation::Unexpected)
        );
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = validate(args(serde_json::json!({ "bucket": 42 })), &definition()).unwrap_err();
        let (parameter, violation) = violation_of(err);
        assert_eq!(parameter, "bucket");
        assert_eq!(
            violation,
            Violation::WrongType {
                expected: "string".into(),
                found: "integer".into()
            }
        );
    }

    #[test]
    fn test_numeric_coercions() {
        let validated = validate(
            args(serde_json::json!({ "bucket": "b", "max_keys": 5.0, "ratio": 3 })),
            &definition(),
        )
        .unwrap();
        assert_eq!(validated.get("max_keys"), Some(&Value::Integer(5)));
        assert_eq!(validated.get("ratio"), Some(&Value::Float(3.0)));

        let err = validate(
            args(serde_json::json!({ "bucket": "b", "max_keys": 5.5 })),
            &definition(),
        )
        .unwrap_err();
        assert_eq!(violation_of(err).0, "max_keys");
    }

    #[test]
    fn test_number_array_items_checked() {
        let validated = validate(
            args(serde_json::json!({ "bucket": "b", "position": [2, 48.5] })),
            &definition(),
        )
        .unwrap();
        assert_eq!(
            validated.get("position"),
            Some(&Value::List(vec![Value::Float(2.0), Value::Float(48.5)]))
        );

        let err = validate(
            args(serde_json::json!({ "bucket": "b", "position": [2, "north"] })),
            &definition(),
        )
        .unwrap_err();
        assert_eq!(violation_of(err).0, "position");
    }

    #[test]
    fn test_enum_values_enforced() {
        assert!(
            validate(
                args(serde_json::json!({ "bucket": "b", "mode": "Walking" })),
                &definition()
            )
            .is_ok()
        );
        let err = validate(
            args(serde_json::json!({ "bucket": "b", "mode": "Boat" })),
            &definition(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("one of Car, Walking"));
    }

    #[test]
    fn test_optional_null_dropped() {
        let validated = validate(
            args(serde_json::json!({ "bucket": "b", "max_keys": null })),
            &definition(),
        )
        .unwrap();
        assert!(validated.get("max_keys").is_none());
        assert_eq!(validated.len(), 1);
    }
}
