//! Tools the model can invoke while answering a question.
//!
//! Each tool exposes a static [`ToolDefinition`] and an async `execute`
//! returning the text handed back to the model together with the source
//! citations it produced. Tools are registered by name in a
//! [`ToolRegistry`], which also keeps the per-query citation log.

mod outline;
mod registry;
mod search;

pub use outline::OutlineTool;
pub use registry::ToolRegistry;
pub use search::ContentSearchTool;

use crate::error::SyllabusError;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

/// One named parameter of a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Machine-readable description of a tool.
///
/// Serializes to the Anthropic tool shape: `name`, `description` and an
/// object `input_schema` with `properties` and `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    /// JSON schema of the tool's input object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind,
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolDefinition", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("input_schema", &self.input_schema())?;
        state.end()
    }
}

/// A source the answer drew on, shown to the user next to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub display_text: String,
    pub lesson_link: Option<String>,
}

impl SourceCitation {
    pub fn new(display_text: impl Into<String>, lesson_link: Option<String>) -> Self {
        Self {
            display_text: display_text.into(),
            lesson_link,
        }
    }
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub citations: Vec<SourceCitation>,
}

impl ToolOutput {
    /// Text without citations.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }

    pub fn with_citations(text: impl Into<String>, citations: Vec<SourceCitation>) -> Self {
        Self {
            text: text.into(),
            citations,
        }
    }
}

/// Exceptional tool failures. Expected domain outcomes (no results, unknown
/// course) are reported as text instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Upstream service temporarily unavailable; the caller should stop.
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Failed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ToolError::Transient(_))
    }
}

impl From<SyllabusError> for ToolError {
    fn from(err: SyllabusError) -> Self {
        if err.is_transient() {
            ToolError::Transient(err.to_string())
        } else {
            ToolError::Failed(err.to_string())
        }
    }
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static definition; pure and deterministic.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with model-supplied parameters.
    async fn execute(&self, params: &Value) -> Result<ToolOutput, ToolError>;
}

/// Dispatches tool invocations requested by the model.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute the invocation `invocation_id` of tool `name`.
    async fn execute_invocation(
        &self,
        invocation_id: &str,
        name: &str,
        input: &Value,
    ) -> Result<String, ToolError>;
}

/// Read a required string parameter.
pub(crate) fn required_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing required parameter '{}'", name)))
}

/// Read an optional, non-empty string parameter.
pub(crate) fn optional_str<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Read an optional non-negative integer parameter. Models sometimes send
/// numbers as strings, so numeric strings are accepted too.
pub(crate) fn optional_u32(params: &Value, name: &str) -> Result<Option<u32>, ToolError> {
    let invalid = || ToolError::InvalidInput(format!("parameter '{}' must be a non-negative integer", name));
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_serializes_to_input_schema() {
        let def = ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search".to_string(),
            parameters: vec![
                ToolParameter::required("query", ParamKind::String, "What to search for"),
                ToolParameter::optional("lesson_number", ParamKind::Integer, "Lesson"),
            ],
        };

        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["name"], "search_course_content");
        assert_eq!(value["input_schema"]["type"], "object");
        assert_eq!(value["input_schema"]["properties"]["query"]["type"], "string");
        assert_eq!(value["input_schema"]["properties"]["lesson_number"]["type"], "integer");
        assert_eq!(value["input_schema"]["required"], json!(["query"]));
    }

    #[test]
    fn test_parameter_helpers() {
        let params = json!({"query": "rust", "course_name": "  ", "lesson_number": "3"});
        assert_eq!(required_str(&params, "query").unwrap(), "rust");
        assert!(required_str(&params, "missing").is_err());
        assert_eq!(optional_str(&params, "course_name"), None);
        assert_eq!(optional_u32(&params, "lesson_number").unwrap(), Some(3));
        assert_eq!(optional_u32(&json!({}), "lesson_number").unwrap(), None);
        assert!(optional_u32(&json!({"lesson_number": -1}), "lesson_number").is_err());
    }

    #[test]
    fn test_tool_error_from_library_error() {
        let transient: ToolError = SyllabusError::Unavailable("embedding API throttled".into()).into();
        assert!(transient.is_transient());

        let failed: ToolError = SyllabusError::VectorStore("disk full".into()).into();
        assert!(!failed.is_transient());
    }
}
