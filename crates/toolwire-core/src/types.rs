//! Tool descriptors, parameter declarations, and content payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Arguments passed to a tool invocation
pub type Arguments = HashMap<String, Value>;

/// Value types a tool parameter can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// UTF-8 string
    String,
    /// Whole number
    Integer,
    /// Floating-point number
    Number,
    /// true/false
    Boolean,
}

impl ParamKind {
    /// Wire name of the type, as it appears in the input schema
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declaration of a single tool parameter
///
/// The registry checks incoming arguments against these before the handler
/// runs, so handlers never see missing or out-of-range input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Declared value type
    pub kind: ParamKind,
    /// Whether the parameter must be present
    pub required: bool,
    /// Value filled in when the parameter is absent
    pub default: Option<Value>,
    /// Inclusive lower bound for numeric parameters
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numeric parameters
    pub maximum: Option<f64>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, description: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Create a required string parameter
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::String)
    }

    /// Create a required integer parameter
    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Integer)
    }

    /// Create a required number parameter
    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Number)
    }

    /// Create a required boolean parameter
    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParamKind::Boolean)
    }

    /// Make the parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the value used when the parameter is absent
    pub fn with_default<V: Into<Value>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Constrain a numeric parameter to an inclusive range
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

/// A tool as advertised on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a registry
    pub name: String,
    /// Tool description
    #[serde(default)]
    pub description: Option<String>,
    /// Input schema (JSON Schema object)
    #[serde(default)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Build a descriptor from typed parameter declarations
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: &[ParamSpec],
    ) -> Self {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in params {
            if param.required {
                required.push(param.name.clone());
            }

            let mut schema = serde_json::Map::new();
            schema.insert("type".to_string(), param.kind.as_str().into());
            schema.insert("description".to_string(), param.description.clone().into());
            if let Some(default) = &param.default {
                schema.insert("default".to_string(), default.clone());
            }
            if let Some(minimum) = param.minimum {
                schema.insert("minimum".to_string(), num_value(minimum));
            }
            if let Some(maximum) = param.maximum {
                schema.insert("maximum".to_string(), num_value(maximum));
            }

            properties.insert(param.name.clone(), schema.into());
        }

        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

// Integer bounds serialize as integers, matching how workers written in other
// stacks advertise them.
fn num_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

/// One block of a success payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text {
        /// The text itself
        text: String,
    },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Borrow the text if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}
