//! Bounded tool-calling loop around the language model.

use crate::config::{LlmSettings, Prompts};
use crate::error::Result;
use crate::llm::{
    ContentBlock, Message, MessageRequest, MessageResponse, ModelClient, RetryPolicy, ToolChoice,
};
use crate::tools::{ToolDefinition, ToolExecutor};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of tool-calling rounds per question.
pub const DEFAULT_MAX_ROUNDS: u32 = 2;

/// Answers questions with a language model, letting it call tools in a
/// bounded number of rounds.
///
/// Each round sends the whole turn sequence. When the model asks for
/// tools, every invocation is executed in order and the results are sent
/// back as one user turn. If the rounds run out right after a tool-result
/// turn, one more request is made without tools to force a final answer,
/// so a question costs at most `max_rounds + 1` model requests.
pub struct Generator {
    client: Arc<dyn ModelClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    system_prompt: String,
}

impl Generator {
    /// Create a generator from settings and prompt templates.
    pub fn from_settings(client: Arc<dyn ModelClient>, settings: &LlmSettings, prompts: &Prompts) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            retry: settings.retry_policy(),
            system_prompt: prompts.generator_system(settings.max_rounds),
        }
    }

    /// Generate an answer and return its text.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &[ToolDefinition],
        executor: Option<&dyn ToolExecutor>,
        max_rounds: u32,
    ) -> Result<String> {
        Ok(self
            .run(query, history, tools, executor, max_rounds)
            .await?
            .text)
    }

    /// Generate an answer and report how it was produced.
    ///
    /// With `max_rounds == 0` the model is asked once and tool requests
    /// are not executed.
    #[instrument(skip_all, fields(max_rounds = max_rounds))]
    pub async fn run(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &[ToolDefinition],
        executor: Option<&dyn ToolExecutor>,
        max_rounds: u32,
    ) -> Result<Generation> {
        let system = self.system_instruction(history);
        let tools = (!tools.is_empty()).then_some(tools);

        let mut messages = vec![Message::user(query)];
        let mut report = Generation::default();
        let mut final_text = String::new();

        for round in 0..max_rounds.max(1) {
            debug!("Generation round {}", round + 1);

            let response = self.request(&system, &messages, tools).await?;
            report.model_requests += 1;
            messages.push(response.to_message());
            final_text = response.text();

            let executor = match executor {
                Some(executor) if response.wants_tools() && round < max_rounds => executor,
                _ => break,
            };

            let invocations = tool_invocations(&response);
            if invocations.is_empty() {
                debug!("Model stopped for tool use without requesting any tool");
                break;
            }

            let (results, aborted) = self
                .execute_batch(executor, &invocations, &mut report.tool_calls)
                .await;
            messages.push(Message::tool_results(results));
            report.tool_batches += 1;

            if aborted {
                report.aborted = true;
                break;
            }
        }

        if messages.last().is_some_and(Message::is_tool_results) {
            debug!("Requesting final answer without tools");
            let response = self.request(&system, &messages, None).await?;
            report.model_requests += 1;
            final_text = response.text();
        }

        info!(
            "Generated answer with {} model requests and {} tool rounds",
            report.model_requests, report.tool_batches
        );
        report.text = final_text;
        Ok(report)
    }

    fn system_instruction(&self, history: Option<&str>) -> String {
        match history.filter(|h| !h.is_empty()) {
            Some(history) => format!(
                "{}\n\nPrevious conversation:\n{}",
                self.system_prompt, history
            ),
            None => self.system_prompt.clone(),
        }
    }

    async fn request(
        &self,
        system: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<MessageResponse> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(<[ToolDefinition]>::to_vec),
            tool_choice: tools.map(|_| ToolChoice::Auto),
        };

        Ok(self
            .retry
            .run(|| self.client.create_message(&request))
            .await?)
    }

    /// Execute one round of invocations in order. Returns one result block
    /// per invocation and whether a transient failure cut the round short.
    async fn execute_batch(
        &self,
        executor: &dyn ToolExecutor,
        invocations: &[Invocation<'_>],
        records: &mut Vec<ToolCallRecord>,
    ) -> (Vec<ContentBlock>, bool) {
        let mut results = Vec::with_capacity(invocations.len());

        for (i, call) in invocations.iter().enumerate() {
            info!("Model calling tool: {} with args: {}", call.name, call.input);

            match executor.execute_invocation(call.id, call.name, call.input).await {
                Ok(output) => {
                    records.push(ToolCallRecord::new(call, &output, false));
                    results.push(ContentBlock::tool_result(call.id, output));
                }
                Err(e) if e.is_transient() => {
                    warn!("Tool {} hit a transient failure, ending tool rounds: {}", call.name, e);
                    let message = format!("Tool execution aborted: {}", e);
                    for pending in &invocations[i..] {
                        records.push(ToolCallRecord::new(pending, &message, true));
                        results.push(error_result(pending.id, &message));
                    }
                    return (results, true);
                }
                Err(e) => {
                    warn!("Tool {} failed: {}", call.name, e);
                    let message = format!("Tool execution failed: {}", e);
                    records.push(ToolCallRecord::new(call, &message, true));
                    results.push(error_result(call.id, &message));
                }
            }
        }

        (results, false)
    }
}

struct Invocation<'a> {
    id: &'a str,
    name: &'a str,
    input: &'a Value,
}

fn tool_invocations(response: &MessageResponse) -> Vec<Invocation<'_>> {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(Invocation { id, name, input }),
            _ => None,
        })
        .collect()
}

fn error_result(tool_use_id: &str, message: &str) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content: message.to_string(),
        is_error: true,
    }
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct Generation {
    /// The final answer text.
    pub text: String,
    /// Model requests issued, not counting retries.
    pub model_requests: usize,
    /// Rounds whose tool invocations were executed.
    pub tool_batches: usize,
    /// Every tool invocation, in execution order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Whether a transient tool failure ended the tool rounds early.
    pub aborted: bool,
}

/// Record of a tool call made by the model.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Invocation id assigned by the model.
    pub id: String,
    pub name: String,
    pub input: Value,
    /// Text returned to the model.
    pub result: String,
    pub failed: bool,
}

impl ToolCallRecord {
    fn new(call: &Invocation<'_>, result: &str, failed: bool) -> Self {
        Self {
            id: call.id.to_string(),
            name: call.name.to_string(),
            input: call.input.clone(),
            result: result.to_string(),
            failed,
        }
    }
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.input)
    }
}
