use super::error::ToolExecutionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved name of the synthetic "final answer" tool.
pub const CONVERSATIONAL_TOOL: &str = "ConversationalResponse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
}

/// Name, description and input schema of a tool.
///
/// Serializes to the JSON layout rendered into the system prompt:
/// `{"name", "description", "properties", "required"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn with_required(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(
            name,
            PropertySchema {
                kind,
                description: description.into(),
            },
        );
        self
    }

    pub fn with_optional(
        mut self,
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.properties.insert(
            name.into(),
            PropertySchema {
                kind,
                description: description.into(),
            },
        );
        self
    }

    /// The synthetic final-answer tool appended to every catalog.
    pub fn conversational() -> Self {
        Self::new(
            CONVERSATIONAL_TOOL,
            "Respond conversationally only if no other tools should be called for a given query, or if you have a final answer.",
        )
        .with_required(
            "response",
            ParamType::String,
            "Conversational response to the user.",
        )
    }

    pub fn is_conversational(name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(CONVERSATIONAL_TOOL)
    }

    /// Check `input` against the declared schema and return it as an object.
    ///
    /// `null` counts as an empty object. A bare string is accepted for tools
    /// with exactly one property and bound to that property.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, ToolExecutionError> {
        let object = match input {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            Value::String(text) if self.properties.len() == 1 => {
                let mut map = Map::new();
                if let Some(name) = self.properties.keys().next() {
                    map.insert(name.clone(), Value::String(text.clone()));
                }
                map
            }
            other => {
                return Err(ToolExecutionError::InvalidInput(format!(
                    "tool '{}' expects a JSON object as input, got {}",
                    self.name,
                    kind_of(other)
                )));
            }
        };

        for name in &self.required {
            if object.get(name).is_none_or(Value::is_null) {
                return Err(ToolExecutionError::InvalidInput(format!(
                    "tool '{}' is missing required field '{name}'",
                    self.name
                )));
            }
        }

        for (name, value) in &object {
            let Some(schema) = self.properties.get(name) else {
                continue;
            };
            if !value.is_null() && !schema.kind.accepts(value) {
                return Err(ToolExecutionError::InvalidInput(format!(
                    "field '{name}' of tool '{}' must be of type {}, got {}",
                    self.name,
                    schema.kind.as_str(),
                    kind_of(value)
                )));
            }
        }

        Ok(object)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
