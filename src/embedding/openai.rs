//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{is_transient_transport, Result, SyllabusError};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Maximum inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder. Reads `OPENAI_API_KEY` from the environment.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder with a custom model, dimensions and request timeout.
    pub fn with_config(model: &str, dimensions: usize, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Client::with_config(OpenAIConfig::default()).with_http_client(http_client),
            model: model.to_string(),
            dimensions,
        })
    }

    /// Create an embedder from settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::with_config(
            &settings.model,
            settings.dimensions as usize,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

/// Map an OpenAI error, marking throttling and transport failures as transient.
fn classify(err: OpenAIError) -> SyllabusError {
    match &err {
        OpenAIError::Reqwest(e) if is_transient_transport(e) => {
            SyllabusError::Unavailable(format!("Embedding API unreachable: {}", err))
        }
        OpenAIError::ApiError(api) => {
            let kind = api
                .r#type
                .as_deref()
                .or(api.code.as_deref())
                .unwrap_or_default();
            classify_api(kind, &api.message)
        }
        _ => SyllabusError::Embedding(format!("Embedding API error: {}", err)),
    }
}

fn classify_api(kind: &str, message: &str) -> SyllabusError {
    if kind.contains("rate_limit") || kind.contains("server_error") || kind.contains("overloaded") {
        SyllabusError::Unavailable(format!("Embedding API throttled: {}", message))
    } else {
        SyllabusError::Embedding(format!("Embedding API error: {}", message))
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SyllabusError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| SyllabusError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self.client.embeddings().create(request).await.map_err(classify)?;

            let mut data = response.data;
            data.sort_by_key(|e| e.index);
            if data.len() != chunk.len() {
                return Err(SyllabusError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    data.len()
                )));
            }
            all_embeddings.extend(data.into_iter().map(|d| d.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
