//! Tool registry: name-keyed dispatch plus the per-query citation log.

use super::{SourceCitation, Tool, ToolDefinition, ToolError, ToolExecutor};
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

#[derive(Default)]
struct CitationLog {
    /// Everything cited since the last reset, in call order.
    session: Vec<SourceCitation>,
    /// Citations of each tool's most recent call that produced any.
    last_by_tool: HashMap<String, Vec<SourceCitation>>,
    by_invocation: HashMap<String, Vec<SourceCitation>>,
}

/// Registered tools, in registration order.
///
/// Tool instances are shared; the citation log is not. Use
/// [`ToolRegistry::fork`] to get a registry with a fresh log for each query.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
    citations: Mutex<CitationLog>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition name. A tool registered under an
    /// existing name replaces the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(SyllabusError::Config(
                "Tool must have a non-empty name".to_string(),
            ));
        }

        if let Some(slot) = self.tools.iter_mut().find(|(n, _)| *n == name) {
            warn!("Replacing previously registered tool '{}'", name);
            slot.1 = tool;
        } else {
            debug!("Registered tool '{}'", name);
            self.tools.push((name, tool));
        }
        Ok(())
    }

    /// Definitions of all registered tools, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, t)| t.definition()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. Unknown names yield a "not found" message.
    pub async fn execute(&self, name: &str, params: &Value) -> std::result::Result<String, ToolError> {
        self.run(None, name, params).await
    }

    #[instrument(skip(self, params))]
    async fn run(
        &self,
        invocation_id: Option<&str>,
        name: &str,
        params: &Value,
    ) -> std::result::Result<String, ToolError> {
        let Some(tool) = self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t) else {
            warn!("Model requested unknown tool '{}'", name);
            return Ok(format!("Tool '{}' not found", name));
        };

        let output = tool.execute(params).await?;

        if !output.citations.is_empty() {
            let mut log = self.log();
            log.session.extend(output.citations.iter().cloned());
            log.last_by_tool
                .insert(name.to_string(), output.citations.clone());
            if let Some(id) = invocation_id {
                log.by_invocation.insert(id.to_string(), output.citations);
            }
        }

        Ok(output.text)
    }

    /// Citations of the first tool, in registration order, whose most recent
    /// call produced any.
    pub fn last_citations(&self) -> Vec<SourceCitation> {
        let log = self.log();
        self.tools
            .iter()
            .find_map(|(name, _)| log.last_by_tool.get(name).filter(|c| !c.is_empty()))
            .cloned()
            .unwrap_or_default()
    }

    /// All citations produced since the last reset.
    pub fn session_citations(&self) -> Vec<SourceCitation> {
        self.log().session.clone()
    }

    /// Citations produced by one model invocation id.
    pub fn citations_for(&self, invocation_id: &str) -> Vec<SourceCitation> {
        self.log()
            .by_invocation
            .get(invocation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reset_citations(&self) {
        *self.log() = CitationLog::default();
    }

    /// Same tools, empty citation log.
    pub fn fork(&self) -> Self {
        Self {
            tools: self.tools.clone(),
            citations: Mutex::new(CitationLog::default()),
        }
    }

    fn log(&self) -> MutexGuard<'_, CitationLog> {
        // The log holds no invariants a panicking writer could break.
        self.citations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute_invocation(
        &self,
        invocation_id: &str,
        name: &str,
        input: &Value,
    ) -> std::result::Result<String, ToolError> {
        self.run(Some(invocation_id), name, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamKind, ToolOutput, ToolParameter};
    use serde_json::json;

    /// Echoes its `text` parameter and cites each `cite` entry.
    struct EchoTool {
        name: &'static str,
        tag: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: "Echo".to_string(),
                parameters: vec![ToolParameter::required("text", ParamKind::String, "Text")],
            }
        }

        async fn execute(&self, params: &Value) -> std::result::Result<ToolOutput, ToolError> {
            let text = params["text"].as_str().unwrap_or_default();
            let citations = params["cite"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|c| SourceCitation::new(c, None))
                        .collect()
                })
                .unwrap_or_default();
            Ok(ToolOutput::with_citations(format!("{}:{}", self.tag, text), citations))
        }
    }

    fn echo(name: &'static str, tag: &'static str) -> Arc<dyn Tool> {
        Arc::new(EchoTool { name, tag })
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("first", "a")).unwrap();
        registry.register(echo("second", "b")).unwrap();

        assert_eq!(registry.tool_names(), vec!["first", "second"]);
        assert_eq!(registry.definitions()[1].name, "second");
        assert_eq!(
            registry.execute("second", &json!({"text": "hi"})).await.unwrap(),
            "b:hi"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_an_error() {
        let registry = ToolRegistry::new();
        let result = registry.execute("unknown_tool", &json!({})).await.unwrap();
        assert!(result.contains("not found"));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(echo("", "x")).unwrap_err();
        assert!(matches!(err, SyllabusError::Config(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("first", "a")).unwrap();
        registry.register(echo("second", "b")).unwrap();
        registry.register(echo("first", "z")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tool_names(), vec!["first", "second"]);
        assert_eq!(registry.execute("first", &json!({"text": "x"})).await.unwrap(), "z:x");
    }

    #[tokio::test]
    async fn test_citation_log() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("first", "a")).unwrap();
        registry.register(echo("second", "b")).unwrap();

        registry
            .execute_invocation("call_1", "second", &json!({"text": "x", "cite": ["S1"]}))
            .await
            .unwrap();
        registry
            .execute_invocation("call_2", "first", &json!({"text": "y", "cite": ["F1", "F2"]}))
            .await
            .unwrap();
        registry
            .execute_invocation("call_3", "first", &json!({"text": "z"}))
            .await
            .unwrap();

        let display = |c: Vec<SourceCitation>| c.into_iter().map(|c| c.display_text).collect::<Vec<_>>();
        assert_eq!(display(registry.session_citations()), vec!["S1", "F1", "F2"]);
        assert_eq!(display(registry.last_citations()), vec!["F1", "F2"]);
        assert_eq!(display(registry.citations_for("call_1")), vec!["S1"]);
        assert!(registry.citations_for("call_3").is_empty());

        registry.reset_citations();
        assert!(registry.session_citations().is_empty());
        assert!(registry.last_citations().is_empty());
    }

    #[tokio::test]
    async fn test_fork_shares_tools_not_citations() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("first", "a")).unwrap();
        registry
            .execute("first", &json!({"text": "x", "cite": ["F1"]}))
            .await
            .unwrap();

        let fork = registry.fork();
        assert_eq!(fork.tool_names(), vec!["first"]);
        assert!(fork.session_citations().is_empty());

        fork.execute("first", &json!({"text": "y", "cite": ["F2"]}))
            .await
            .unwrap();
        assert_eq!(registry.session_citations().len(), 1);
        assert_eq!(fork.session_citations().len(), 1);
    }
}
