//! Tool descriptors and parameter validation.
//!
//! Every tool declares its parameters once, as a serde struct deriving
//! `JsonSchema`. The generated schema is the MCP `inputSchema`; the
//! [`ParamSpec`] list read back from it drives the REST listing and the
//! registry's validation, so a tool looks the same through every transport.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ToolError;

/// Parameters of a tool that takes none.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Read the `type` keyword of a property schema.
    ///
    /// `["integer", "null"]` style unions resolve to their non-null member.
    fn from_schema(property: &Value) -> Self {
        let name = match property.get("type") {
            Some(Value::String(name)) => name.as_str(),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")
                .unwrap_or("string"),
            _ => "string",
        };
        match name {
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            _ => Self::String,
        }
    }

    /// Whether `value` has this JSON type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    /// Allowed string values (empty means unrestricted).
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

impl ParamSpec {
    /// Read one property of an object schema.
    fn from_property(name: &str, property: &Value, required: bool) -> Self {
        let bound = |key: &str| property.get(key).and_then(Value::as_f64).map(|b| b as i64);

        Self {
            name: name.to_string(),
            param_type: ParamType::from_schema(property),
            required,
            default: property.get("default").filter(|d| !d.is_null()).cloned(),
            description: property
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            minimum: bound("minimum"),
            maximum: bound("maximum"),
            allowed: property
                .get("enum")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Check type, range and allowed values of a supplied value.
    pub fn check(&self, value: &Value) -> Result<(), ToolError> {
        if !self.param_type.matches(value) {
            return Err(ToolError::InvalidParameterType(format!(
                "'{}' must be {} (got {})",
                self.name,
                self.param_type,
                json_type_name(value)
            )));
        }

        if let Some(number) = value.as_f64() {
            let below = self.minimum.is_some_and(|min| number < min as f64);
            let above = self.maximum.is_some_and(|max| number > max as f64);
            if below || above {
                return Err(ToolError::invalid_value(format!(
                    "'{}' must be between {} and {} (got {})",
                    self.name,
                    self.minimum.map_or("-inf".to_string(), |m| m.to_string()),
                    self.maximum.map_or("+inf".to_string(), |m| m.to_string()),
                    value
                )));
            }
        }

        if let (false, Some(text)) = (self.allowed.is_empty(), value.as_str()) {
            if !self.allowed.iter().any(|a| a.eq_ignore_ascii_case(text.trim())) {
                return Err(ToolError::invalid_value(format!(
                    "'{}' must be one of: {} (got '{}')",
                    self.name,
                    self.allowed.join(", "),
                    text
                )));
            }
        }

        Ok(())
    }
}

/// Protocol-neutral description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,

    #[serde(skip)]
    input_schema: Map<String, Value>,
}

impl ToolDescriptor {
    /// Describe a tool whose arguments deserialize into `P`.
    pub fn for_params<P: JsonSchema>(name: &str, description: &str) -> Self {
        let mut input_schema = match schemars::schema_for!(P).to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        input_schema.remove("$schema");
        input_schema.remove("title");
        input_schema.remove("description");

        let required: Vec<&str> = input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let parameters = input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| {
                        ParamSpec::from_property(name, property, required.contains(&name.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            input_schema,
        }
    }

    /// JSON Schema (`type: object`) describing the tool input.
    pub fn input_schema(&self) -> &Map<String, Value> {
        &self.input_schema
    }

    /// Validate call arguments and apply defaults.
    ///
    /// `null` arguments count as an empty object and `null` values as omitted.
    /// Undeclared arguments are dropped.
    pub fn validate(&self, arguments: Value) -> Result<Map<String, Value>, ToolError> {
        let mut provided = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidParameterType(format!(
                    "arguments must be an object (got {})",
                    json_type_name(&other)
                )));
            }
        };

        let mut resolved = Map::new();
        for spec in &self.parameters {
            match provided.remove(&spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    spec.check(&value)?;
                    resolved.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    return Err(ToolError::MissingParameter(spec.name.clone()));
                }
                None => {
                    if let Some(default) = &spec.default {
                        resolved.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(resolved)
    }
}
