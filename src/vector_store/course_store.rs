//! Course-aware search on top of a [`VectorStore`] backend.

use super::{ChunkFilter, ChunkRecord, CourseRecord, SearchHit, SearchResults, VectorStore};
use crate::document::{Course, CourseChunk};
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Minimum title similarity for a semantic course name match.
pub const DEFAULT_COURSE_MATCH_THRESHOLD: f32 = 0.35;

/// Course catalog and content search.
///
/// Course names given by users or the model are often partial ("the MCP
/// course"); [`CourseStore::resolve_course_name`] maps them to a catalogued
/// title before filtering.
pub struct CourseStore {
    backend: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
    course_match_threshold: f32,
}

impl CourseStore {
    pub fn new(backend: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, max_results: usize) -> Self {
        Self {
            backend,
            embedder,
            max_results,
            course_match_threshold: DEFAULT_COURSE_MATCH_THRESHOLD,
        }
    }

    pub fn with_course_match_threshold(mut self, threshold: f32) -> Self {
        self.course_match_threshold = threshold;
        self
    }

    /// Add (or replace) a course in the catalog, embedded by title.
    #[instrument(skip(self, course), fields(title = %course.title))]
    pub async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        self.backend
            .upsert_course(&CourseRecord::new(course.clone(), embedding))
            .await
    }

    /// Embed and store content chunks. Returns the number stored.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(SyllabusError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        let dimensions = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(SyllabusError::Embedding(format!(
                "Expected {} dimensions, got {}",
                dimensions,
                bad.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
            .collect();

        self.backend.upsert_chunks(&records).await
    }

    /// Remove a course and its content. Returns the number of chunks removed.
    pub async fn remove_course(&self, title: &str) -> Result<usize> {
        self.backend.delete_course(title).await
    }

    /// Search course content with the default result limit.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<SearchResults> {
        self.search_with_limit(query, course_name, lesson_number, None).await
    }

    /// Search course content, optionally restricted to a course and lesson.
    ///
    /// An unresolvable course name and non-transient backend failures are
    /// reported through [`SearchResults::error`]. Transient failures are
    /// returned as `Err` so callers can stop early.
    #[instrument(skip(self))]
    pub async fn search_with_limit(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        match self.try_search(query, course_name, lesson_number, limit).await {
            Ok(results) => Ok(results),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                warn!("Search failed: {}", e);
                Ok(SearchResults::with_error(format!("Search error: {}", e)))
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await? {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::with_error(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let filter = ChunkFilter {
            course_title,
            lesson_number,
        };
        let embedding = self.embedder.embed(query).await?;
        let scored = self
            .backend
            .search_chunks(&embedding, &filter, limit.unwrap_or(self.max_results))
            .await?;

        debug!("Search returned {} hits", scored.len());
        Ok(SearchResults::from_hits(
            scored.into_iter().map(SearchHit::from).collect(),
        ))
    }

    /// Map a possibly partial course name to a catalogued title.
    ///
    /// Tries an exact case-insensitive match, then a substring match, then
    /// the most similar title embedding above the match threshold.
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let titles = self.backend.course_titles().await?;
        if titles.is_empty() {
            return Ok(None);
        }

        if let Some(title) = titles.iter().find(|t| t.to_lowercase() == needle) {
            return Ok(Some(title.clone()));
        }
        if let Some(title) = titles.iter().find(|t| t.to_lowercase().contains(&needle)) {
            return Ok(Some(title.clone()));
        }

        let embedding = self.embedder.embed(name).await?;
        let best = self.backend.search_courses(&embedding, 1).await?.into_iter().next();
        Ok(best.and_then(|m| {
            debug!("Best title match for {:?}: {} ({:.3})", name, m.title, m.score);
            (m.score >= self.course_match_threshold).then_some(m.title)
        }))
    }

    /// Metadata for an exact course title.
    pub async fn course_metadata(&self, title: &str) -> Result<Option<Course>> {
        self.backend.get_course(title).await
    }

    pub async fn course_link(&self, title: &str) -> Result<Option<String>> {
        Ok(self
            .course_metadata(title)
            .await?
            .and_then(|c| c.course_link))
    }

    pub async fn lesson_link(&self, title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self.course_metadata(title).await?.and_then(|c| {
            c.lesson(lesson_number)
                .and_then(|l| l.lesson_link.clone())
        }))
    }

    pub async fn course_titles(&self) -> Result<Vec<String>> {
        self.backend.course_titles().await
    }

    pub async fn course_count(&self) -> Result<usize> {
        Ok(self.backend.course_titles().await?.len())
    }

    pub async fn chunk_count(&self) -> Result<usize> {
        self.backend.chunk_count().await
    }

    /// Remove every course and chunk.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await?;
        info!("Cleared course store");
        Ok(())
    }
}
