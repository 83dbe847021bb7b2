//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! Course catalogs are small, and chunk counts per deployment are in the
//! thousands, so a full scan per query is acceptable.

use super::{
    cosine_similarity, rank, ChunkFilter, ChunkRecord, CourseMatch, CourseRecord, ScoredChunk,
    VectorStore,
};
use crate::document::{Course, CourseChunk, Lesson};
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    instructor TEXT,
    course_link TEXT,
    lessons_json TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
CREATE INDEX IF NOT EXISTS idx_chunks_course_lesson ON chunks(course_title, lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn course_from_row(
        title: String,
        instructor: Option<String>,
        course_link: Option<String>,
        lessons_json: &str,
    ) -> Result<Course> {
        let lessons: Vec<Lesson> = serde_json::from_str(lessons_json)?;
        Ok(Course {
            title,
            course_link,
            instructor,
            lessons,
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, record), fields(title = %record.course.title))]
    async fn upsert_course(&self, record: &CourseRecord) -> Result<()> {
        let conn = self.conn()?;
        let course = &record.course;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, instructor, course_link, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                course.title,
                course.instructor,
                course.course_link,
                lessons_json,
                Self::embedding_to_bytes(&record.embedding),
                record.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted course {}", course.title);
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        for record in chunks {
            let chunk = &record.chunk;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.id.to_string(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index as i64,
                    chunk.content,
                    Self::embedding_to_bytes(&record.embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, course_title, lesson_number, chunk_index, content, embedding
            FROM chunks
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![filter.course_title, filter.lesson_number], |row| {
            let id_str: String = row.get(0)?;
            let chunk_index: i64 = row.get(3)?;
            let embedding_bytes: Vec<u8> = row.get(5)?;

            Ok(ChunkRecord {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                chunk: CourseChunk {
                    course_title: row.get(1)?,
                    lesson_number: row.get(2)?,
                    chunk_index: chunk_index.max(0) as usize,
                    content: row.get(4)?,
                },
                embedding: Self::bytes_to_embedding(&embedding_bytes),
            })
        })?;

        let mut scored = Vec::new();
        for record in rows {
            let record = record?;
            let score = cosine_similarity(query_embedding, &record.embedding);
            scored.push(ScoredChunk { record, score });
        }

        let results = rank(scored, limit, |s| s.score);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_courses(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CourseMatch>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT title, embedding FROM courses")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((title, embedding_bytes))
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let (title, bytes) = row?;
            let score = cosine_similarity(query_embedding, &Self::bytes_to_embedding(&bytes));
            matches.push(CourseMatch { title, score });
        }

        Ok(rank(matches, limit, |m| m.score))
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT title, instructor, course_link, lessons_json FROM courses WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((title, instructor, link, lessons_json)) => Ok(Some(Self::course_from_row(
                title,
                instructor,
                link,
                &lessons_json,
            )?)),
            None => Ok(None),
        }
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, title: &str) -> Result<usize> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;
        tx.execute("DELETE FROM courses WHERE title = ?1", params![title])?;
        tx.commit()?;

        info!("Deleted course {} ({} chunks)", title, deleted);
        Ok(deleted)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared vector store");
        Ok(())
    }
}
