//! Bind parameter marshaling for the RDS Data API.
//!
//! Parameters arrive either named (`{"id": 7}`) or ordered
//! (`[{"name": "id", "value": 7}]`). Values map onto Data API fields by type;
//! the explicit typed form (`{"longValue": 7}`) is accepted as well.

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::{FieldValue, SqlParam};
use crate::domains::tools::{ToolError, Value};

const PARAMETERS: &str = "parameters";

/// Marshal the `parameters` argument into Data API bind parameters.
pub fn marshal_parameters(parameters: Option<&Value>) -> Result<Vec<SqlParam>, ToolError> {
    match parameters {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Map(named)) => named
            .iter()
            .map(|(name, value)| param(name, value))
            .collect(),
        Some(Value::List(ordered)) => {
            let mut seen = HashSet::new();
            let mut params = Vec::with_capacity(ordered.len());
            for (index, entry) in ordered.iter().enumerate() {
                let (name, value) = ordered_entry(index, entry)?;
                if !seen.insert(name) {
                    return Err(ToolError::parameter_type(
                        PARAMETERS,
                        format!("duplicate parameter name '{name}'"),
                    ));
                }
                params.push(param(name, value)?);
            }
            Ok(params)
        }
        Some(other) => Err(ToolError::parameter_type(
            PARAMETERS,
            format!("expected an object or an array of {{name, value}}, got {}", other.kind()),
        )),
    }
}

fn ordered_entry(index: usize, entry: &Value) -> Result<(&str, &Value), ToolError> {
    let location = format!("{PARAMETERS}[{index}]");
    let map = entry.as_map().ok_or_else(|| {
        ToolError::parameter_type(&location, "expected an object with name and value")
    })?;
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ToolError::parameter_type(&location, "missing parameter name"))?;
    let value = map.get("value").unwrap_or(&Value::Null);
    Ok((name, value))
}

fn param(name: &str, value: &Value) -> Result<SqlParam, ToolError> {
    Ok(SqlParam {
        name: name.to_string(),
        value: field(name, value)?,
    })
}

fn field(name: &str, value: &Value) -> Result<FieldValue, ToolError> {
    let location = || format!("{PARAMETERS}.{name}");
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        Value::Integer(i) => Ok(FieldValue::Long(*i)),
        Value::Float(f) if f.is_finite() => Ok(FieldValue::Double(*f)),
        Value::Float(_) => Err(ToolError::parameter_type(
            location(),
            "non-finite numbers cannot be bound",
        )),
        Value::String(s) => Ok(FieldValue::String(s.clone())),
        Value::Binary(bytes) => Ok(FieldValue::Blob(bytes.clone())),
        Value::List(_) => Err(ToolError::parameter_type(
            location(),
            "arrays cannot be bound as statement parameters",
        )),
        Value::Map(map) => typed_field(map, location),
    }
}

/// The explicit `{"<type>Value": ..}` form.
fn typed_field(
    map: &std::collections::BTreeMap<String, Value>,
    location: impl Fn() -> String,
) -> Result<FieldValue, ToolError> {
    let mut entries = map.iter();
    let (Some((tag, inner)), None) = (entries.next(), entries.next()) else {
        return Err(ToolError::parameter_type(
            location(),
            "objects must hold exactly one typed value such as {\"stringValue\": ..}",
        ));
    };

    let mismatch = |expected: &str| {
        ToolError::parameter_type(
            location(),
            format!("{tag} expects {expected}, got {}", inner.kind()),
        )
    };

    match (tag.as_str(), inner) {
        ("stringValue", Value::String(s)) => Ok(FieldValue::String(s.clone())),
        ("longValue", Value::Integer(i)) => Ok(FieldValue::Long(*i)),
        ("doubleValue", Value::Float(f)) if f.is_finite() => Ok(FieldValue::Double(*f)),
        ("doubleValue", Value::Integer(i)) => Ok(FieldValue::Double(*i as f64)),
        ("booleanValue", Value::Bool(b)) => Ok(FieldValue::Boolean(*b)),
        ("isNull", Value::Bool(true)) => Ok(FieldValue::Null),
        ("blobValue", Value::String(encoded)) => BASE64
            .decode(encoded)
            .map(FieldValue::Blob)
            .map_err(|_| ToolError::parameter_type(location(), "blobValue is not valid base64")),
        ("blobValue", Value::Binary(bytes)) => Ok(FieldValue::Blob(bytes.clone())),
        ("stringValue", _) | ("blobValue", _) => Err(mismatch("a string")),
        ("longValue", _) => Err(mismatch("an integer")),
        ("doubleValue", _) => Err(mismatch("a finite number")),
        ("booleanValue", _) => Err(mismatch("a boolean")),
        ("isNull", _) => Err(mismatch("true")),
        (other, _) => Err(ToolError::parameter_type(
            location(),
            format!("unsupported typed value '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ErrorKind;
    use serde_json::json;

    fn marshal(json: serde_json::Value) -> Result<Vec<SqlParam>, ToolError> {
        marshal_parameters(Some(&Value::from_json(json)))
    }

    #[test]
    fn test_named_parameters() {
        let params = marshal(json!({ "id": 7, "name": "ada", "score": 1.5, "active": true, "note": null }))
            .unwrap();
        let by_name = |n: &str| params.iter().find(|p| p.name == n).unwrap().value.clone();
        assert_eq!(by_name("id"), FieldValue::Long(7));
        assert_eq!(by_name("name"), FieldValue::String("ada".to_string()));
        assert_eq!(by_name("score"), FieldValue::Double(1.5));
        assert_eq!(by_name("active"), FieldValue::Boolean(true));
        assert_eq!(by_name("note"), FieldValue::Null);
    }

    #[test]
    fn test_ordered_parameters_keep_order_and_typed_values() {
        let params = marshal(json!([
            { "name": "b", "value": { "stringValue": "x" } },
            { "name": "a", "value": { "blobValue": "AAE=" } },
            { "name": "c", "value": { "isNull": true } }
        ]))
        .unwrap();
        assert_eq!(params[0].name, "b");
        assert_eq!(params[0].value, FieldValue::String("x".to_string()));
        assert_eq!(params[1].value, FieldValue::Blob(vec![0, 1]));
        assert_eq!(params[2].value, FieldValue::Null);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = marshal(json!([
            { "name": "id", "value": 1 },
            { "name": "id", "value": 2 }
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterTypeError);
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_lists_and_plain_objects_rejected() {
        let err = marshal(json!({ "ids": [1, 2] })).unwrap_err();
        assert_eq!(err.descriptor().parameter.as_deref(), Some("parameters.ids"));

        let err = marshal(json!({ "filter": { "a": 1, "b": 2 } })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterTypeError);

        let err = marshal(json!({ "n": { "longValue": "7" } })).unwrap_err();
        assert!(err.to_string().contains("longValue"));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let params = marshal_parameters(Some(&Value::Map(
            [("x".to_string(), Value::Float(f64::NAN))].into_iter().collect(),
        )));
        assert_eq!(params.unwrap_err().kind(), ErrorKind::ParameterTypeError);
    }

    #[test]
    fn test_absent_parameters() {
        assert!(marshal_parameters(None).unwrap().is_empty());
        assert!(marshal_parameters(Some(&Value::Null)).unwrap().is_empty());
        assert!(marshal(json!("id=1")).is_err());
    }
}
