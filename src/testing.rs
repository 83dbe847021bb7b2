//! Scripted fakes shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use crate::llm::{ContentBlock, MessageRequest, MessageResponse, ModelClient, ModelError, StopReason, Usage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Model client replaying a queue of canned responses and recording every
/// request it receives. An exhausted script answers with a permanent error.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<std::result::Result<MessageResponse, ModelError>>>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: MessageResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: ModelError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn create_message(
        &self,
        request: &MessageRequest,
    ) -> std::result::Result<MessageResponse, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Permanent("script exhausted".to_string())))
    }
}

/// A response asking for the given `(id, tool name, input)` invocations.
pub fn tool_use_response(calls: &[(&str, &str, Value)]) -> MessageResponse {
    MessageResponse {
        id: String::new(),
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
        stop_reason: Some(StopReason::ToolUse),
        usage: Usage::default(),
    }
}

/// Deterministic embedder: one dimension per keyword, counting occurrences
/// (case-insensitive). Texts sharing keywords end up close together.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count() as f32)
            .collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }
}

/// Embedder that always fails, transiently or not.
pub struct FailingEmbedder {
    pub transient: bool,
}

impl FailingEmbedder {
    fn error(&self) -> SyllabusError {
        if self.transient {
            SyllabusError::Unavailable("embedding API throttled".to_string())
        } else {
            SyllabusError::Embedding("invalid model".to_string())
        }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(self.error())
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(self.error())
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Embeds single texts like [`KeywordEmbedder`] but fails every batch, so a
/// course title can be stored while its content cannot.
pub struct BatchFailingEmbedder {
    inner: KeywordEmbedder,
}

impl BatchFailingEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            inner: KeywordEmbedder::new(keywords),
        }
    }
}

#[async_trait]
impl Embedder for BatchFailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(SyllabusError::Embedding("batch rejected".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
