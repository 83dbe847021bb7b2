//! Configuration settings for Syllabus.

use crate::error::{Result, SyllabusError};
use crate::agent::DEFAULT_MAX_ROUNDS;
use crate::llm::RetryPolicy;
use crate::session::DEFAULT_MAX_SESSIONS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub search: SearchSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.syllabus".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Anthropic model identifier.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Maximum tool-calling rounds per question.
    pub max_rounds: u32,
    /// Retries for rate-limited or unreachable model requests.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each attempt.
    pub retry_base_delay_ms: u64,
    /// Transport timeout for a single model request.
    pub timeout_secs: u64,
    /// Override of the API base URL.
    pub api_base: Option<String>,
    /// Value of the `anthropic-version` header.
    pub api_version: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            timeout_secs: 60,
            api_base: None,
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl LlmSettings {
    /// Retry policy derived from these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_base_delay_ms))
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Transport timeout for embedding requests.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 60,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.syllabus/courses.db".to_string(),
        }
    }
}

/// Retrieval and chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Hits returned per content search.
    pub max_results: usize,
    /// Chunk budget in characters.
    pub chunk_size: usize,
    /// Characters carried over between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Minimum similarity for resolving a course name by embedding.
    pub course_match_threshold: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            chunk_size: 800,
            chunk_overlap: 100,
            course_match_threshold: 0.35,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Exchanges (question and answer pairs) remembered per session.
    pub max_history: usize,
    /// Sessions kept in memory; the least recently used is dropped first.
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_history: 2,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Folder of course documents loaded at startup.
    pub docs_dir: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            docs_dir: None,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.search.chunk_size == 0 {
            return Err(SyllabusError::Config("search.chunk_size must be positive".to_string()));
        }
        if self.search.chunk_overlap >= self.search.chunk_size {
            return Err(SyllabusError::Config(format!(
                "search.chunk_overlap ({}) must be smaller than search.chunk_size ({})",
                self.search.chunk_overlap, self.search.chunk_size
            )));
        }
        if self.session.max_sessions == 0 {
            return Err(SyllabusError::Config("session.max_sessions must be positive".to_string()));
        }
        if self.llm.max_tokens == 0 {
            return Err(SyllabusError::Config("llm.max_tokens must be positive".to_string()));
        }
        match self.vector_store.provider.as_str() {
            "sqlite" | "memory" => Ok(()),
            other => Err(SyllabusError::Config(format!(
                "Unknown vector store provider: {}",
                other
            ))),
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SyllabusError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syllabus")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded startup documents folder, if configured.
    pub fn docs_dir(&self) -> Option<PathBuf> {
        self.server.docs_dir.as_deref().map(Self::expand_path)
    }
}
