//! Configuration module for Syllabus.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GeneratorPrompts, Prompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, LlmSettings, PromptSettings, SearchSettings,
    ServerSettings, SessionSettings, Settings, VectorStoreSettings,
};
