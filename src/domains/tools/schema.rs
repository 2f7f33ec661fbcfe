//! Parameter schemas for tool definitions.
//!
//! A tool's parameters are an ordered list of [`ParamSpec`]s. The same list
//! drives argument validation and the JSON Schema advertised to clients.

use serde_json::{Map, Value as Json, json};

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// Bytes, sent as `{"$binary": "<base64>"}`.
    Binary,
    Array,
    StringArray,
    NumberArray,
    Object,
    /// Any value; the tool checks it itself.
    Any,
}

impl ParamType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::Array => "array",
            Self::StringArray => "array of strings",
            Self::NumberArray => "array of numbers",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    fn json_schema(&self) -> Map<String, Json> {
        let schema = match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Binary => json!({
                "type": "object",
                "properties": {
                    "$binary": { "type": "string", "contentEncoding": "base64" }
                },
                "required": ["$binary"]
            }),
            Self::Array => json!({ "type": "array" }),
            Self::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            Self::NumberArray => json!({ "type": "array", "items": { "type": "number" } }),
            Self::Object => json!({ "type": "object" }),
            Self::Any => json!({}),
        };
        match schema {
            Json::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
    /// Closed set of accepted string values, if any.
    pub allowed: Option<&'static [&'static str]>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            description,
            allowed: None,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty, description)
        }
    }

    /// Restrict a string parameter to the given values.
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }
}

/// Build the JSON Schema object describing a parameter list.
///
/// Unknown properties are rejected by the validator, so the schema says so too.
pub fn input_schema(params: &[ParamSpec]) -> Map<String, Json> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut schema = param.ty.json_schema();
        schema.insert("description".into(), Json::String(param.description.into()));
        if let Some(allowed) = param.allowed {
            schema.insert("enum".into(), json!(allowed));
        }
        properties.insert(param.name.into(), Json::Object(schema));
        if param.required {
            required.push(Json::String(param.name.into()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), Json::String("object".into()));
    schema.insert("properties".into(), Json::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Json::Array(required));
    }
    schema.insert("additionalProperties".into(), Json::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema_lists_required_params() {
        let params = vec![
            ParamSpec::required("bucket", ParamType::String, "Bucket name"),
            ParamSpec::optional("max_keys", ParamType::Integer, "Page limit"),
        ];
        let schema = Json::Object(input_schema(&params));

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["bucket"]));
        assert_eq!(schema["properties"]["max_keys"]["type"], "integer");
        assert_eq!(schema["properties"]["bucket"]["description"], "Bucket name");
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_input_schema_without_params() {
        let schema = Json::Object(input_schema(&[]));
        assert!(schema.get("required").is_none());
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn test_enum_values_are_advertised() {
        let params = vec![
            ParamSpec::optional("mode", ParamType::String, "Mode").one_of(&["Car", "Truck"]),
        ];
        let schema = Json::Object(input_schema(&params));
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["Car", "Truck"]));
    }
}
