//! Vector store abstraction for Syllabus.
//!
//! Backends implement [`VectorStore`] and keep two collections: the course
//! catalog (one record per course, embedded by title) and the content chunks.
//! [`CourseStore`] layers course name resolution and filtered search on top.

mod course_store;
mod memory;
mod sqlite;

pub use course_store::{CourseStore, DEFAULT_COURSE_MATCH_THRESHOLD};
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::Settings;
use crate::document::{Course, CourseChunk};
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A catalog entry: course metadata plus the embedding of its title.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub course: Course,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl CourseRecord {
    pub fn new(course: Course, embedding: Vec<f32>) -> Self {
        Self {
            course,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A stored content chunk with its embedding.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub chunk: CourseChunk,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(chunk: CourseChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk,
            embedding,
        }
    }
}

/// Restricts a chunk search to one course and/or lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl ChunkFilter {
    pub fn matches(&self, chunk: &CourseChunk) -> bool {
        self.course_title
            .as_ref()
            .map_or(true, |t| *t == chunk.course_title)
            && self
                .lesson_number
                .map_or(true, |n| chunk.lesson_number == Some(n))
    }
}

/// A chunk with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// A catalog entry matched by title embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseMatch {
    pub title: String,
    pub score: f32,
}

/// One search hit as seen by tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
    pub score: f32,
}

impl From<ScoredChunk> for SearchHit {
    fn from(scored: ScoredChunk) -> Self {
        let chunk = scored.record.chunk;
        Self {
            content: chunk.content,
            course_title: chunk.course_title,
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
            score: scored.score,
        }
    }
}

/// Outcome of a course content search. Expected failures (unknown course,
/// backend errors) are carried as an error message rather than an `Err`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    /// Empty results carrying an error message.
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a course catalog entry.
    async fn upsert_course(&self, record: &CourseRecord) -> Result<()>;

    /// Bulk insert content chunks.
    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize>;

    /// Most similar chunks passing `filter`, best first.
    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Catalog entries whose title embedding is most similar, best first.
    async fn search_courses(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>>;

    /// Metadata of a course by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// Titles of all catalogued courses, sorted.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Delete a course and its chunks; returns the number of chunks removed.
    async fn delete_course(&self, title: &str) -> Result<usize>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;
}

/// Open the backend selected by `vector_store.provider`.
pub fn open_backend(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.as_str() {
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        other => Err(SyllabusError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort scored items best first and keep the top `limit`.
pub(crate) fn rank<T>(mut items: Vec<T>, limit: usize, score: impl Fn(&T) -> f32) -> Vec<T> {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(limit);
    items
}
