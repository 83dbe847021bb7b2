//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod ingest;
mod outline;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use ingest::run_ingest;
pub use outline::run_outline;
pub use search::run_search;
pub use serve::run_serve;

use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::vector_store::{self, CourseStore};
use std::sync::Arc;

/// Open the configured course store without a language model client.
fn open_store(settings: &Settings) -> Result<CourseStore> {
    let backend = vector_store::open_backend(settings)?;
    let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
    Ok(
        CourseStore::new(backend, embedder, settings.search.max_results)
            .with_course_match_threshold(settings.search.course_match_threshold),
    )
}
