//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank, ChunkFilter, ChunkRecord, CourseMatch, CourseRecord, ScoredChunk,
    VectorStore,
};
use crate::document::Course;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Collections {
    /// Catalog keyed by title; ordered so titles come out sorted.
    courses: BTreeMap<String, CourseRecord>,
    chunks: Vec<ChunkRecord>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    inner: RwLock<Collections>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, record: &CourseRecord) -> Result<()> {
        self.write()?
            .courses
            .insert(record.course.title.clone(), record.clone());
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        let mut inner = self.write()?;
        for record in chunks {
            inner.chunks.retain(|c| c.id != record.id);
            inner.chunks.push(record.clone());
        }
        Ok(chunks.len())
    }

    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let inner = self.read()?;

        let scored: Vec<ScoredChunk> = inner
            .chunks
            .iter()
            .filter(|r| filter.matches(&r.chunk))
            .map(|r| ScoredChunk {
                record: r.clone(),
                score: cosine_similarity(query_embedding, &r.embedding),
            })
            .collect();

        Ok(rank(scored, limit, |s| s.score))
    }

    async fn search_courses(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>> {
        let inner = self.read()?;

        let matches: Vec<CourseMatch> = inner
            .courses
            .values()
            .map(|r| CourseMatch {
                title: r.course.title.clone(),
                score: cosine_similarity(query_embedding, &r.embedding),
            })
            .collect();

        Ok(rank(matches, limit, |m| m.score))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        Ok(self.read()?.courses.get(title).map(|r| r.course.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.read()?.courses.keys().cloned().collect())
    }

    async fn delete_course(&self, title: &str) -> Result<usize> {
        let mut inner = self.write()?;
        inner.courses.remove(title);
        let initial_len = inner.chunks.len();
        inner.chunks.retain(|c| c.chunk.course_title != title);
        Ok(initial_len - inner.chunks.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.chunks.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.courses.clear();
        inner.chunks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CourseChunk;

    fn chunk(course: &str, lesson: u32, index: usize, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(
            CourseChunk {
                content: format!("{} lesson {} part {}", course, lesson, index),
                course_title: course.to_string(),
                lesson_number: Some(lesson),
                chunk_index: index,
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_course(&CourseRecord::new(Course::new("Rust"), vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_course(&CourseRecord::new(Course::new("Go"), vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();

        store
            .upsert_chunks(&[
                chunk("Rust", 1, 0, vec![1.0, 0.0, 0.0]),
                chunk("Rust", 2, 1, vec![0.7, 0.7, 0.0]),
                chunk("Go", 1, 0, vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 3);
        assert_eq!(store.course_titles().await.unwrap(), vec!["Go", "Rust"]);

        let results = store
            .search_chunks(&[1.0, 0.0, 0.0], &ChunkFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].record.chunk.course_title, "Rust");
        assert!(results[0].score > results[1].score);

        let filter = ChunkFilter {
            course_title: Some("Rust".to_string()),
            lesson_number: Some(2),
        };
        let results = store.search_chunks(&[1.0, 0.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.chunk.lesson_number, Some(2));

        let courses = store.search_courses(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(courses[0].title, "Go");

        assert_eq!(store.delete_course("Rust").await.unwrap(), 2);
        assert_eq!(store.course_titles().await.unwrap(), vec!["Go"]);

        store.clear().await.unwrap();
        assert_eq!(store.chunk_count().await.unwrap(), 0);
        assert!(store.get_course("Go").await.unwrap().is_none());
    }
}
