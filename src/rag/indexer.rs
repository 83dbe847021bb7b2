//! Course document indexing.

use super::IngestReport;
use crate::document::{Course, CourseChunk, DocumentProcessor};
use crate::error::Result;
use crate::vector_store::CourseStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Parses course documents and stores them in a [`CourseStore`].
pub struct CourseIndexer {
    processor: DocumentProcessor,
    store: Arc<CourseStore>,
}

impl CourseIndexer {
    pub fn new(processor: DocumentProcessor, store: Arc<CourseStore>) -> Self {
        Self { processor, store }
    }

    pub fn store(&self) -> Arc<CourseStore> {
        self.store.clone()
    }

    /// Index one course document, replacing any earlier version of the
    /// course. Returns the course and the number of chunks stored.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.processor.process_file(path)?;

        let removed = self.store.remove_course(&course.title).await?;
        if removed > 0 {
            debug!("Replaced {} chunks of {}", removed, course.title);
        }

        let stored = self.index(&course, &chunks).await?;

        info!("Indexed {} ({} chunks)", course.title, stored);
        Ok((course, stored))
    }

    /// Index every supported document in `folder`. Courses that are already
    /// indexed are skipped; files that fail are logged and skipped.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        if clear_existing {
            info!("Clearing existing course data");
            self.store.clear().await?;
        }

        if !folder.is_dir() {
            warn!("Folder {:?} does not exist", folder);
            return Ok(report);
        }

        let mut paths: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && DocumentProcessor::is_supported(p))
            .collect();
        paths.sort();

        let mut existing = self.store.course_titles().await?;

        for path in paths {
            let (course, chunks) = match self.processor.process_file(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Failed to process {:?}: {}", path, e);
                    report.failed += 1;
                    continue;
                }
            };

            if existing.contains(&course.title) {
                info!("Course already indexed, skipping: {}", course.title);
                report.skipped += 1;
                continue;
            }

            let stored = match self.index(&course, &chunks).await {
                Ok(stored) => stored,
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => {
                    warn!("Failed to index {:?}: {}", path, e);
                    report.failed += 1;
                    continue;
                }
            };

            info!("Indexed {} ({} chunks)", course.title, stored);
            report.courses += 1;
            report.chunks += stored;
            existing.push(course.title);
        }

        Ok(report)
    }

    /// Store a course and its content. A course whose content could not be
    /// stored is removed again so a later run indexes it from scratch.
    async fn index(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        let result = match self.store.add_course_metadata(course).await {
            Ok(()) => self.store.add_course_content(chunks).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = self.store.remove_course(&course.title).await {
                warn!("Failed to roll back {}: {}", course.title, e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BatchFailingEmbedder, KeywordEmbedder};
    use crate::vector_store::VectorStore;
    use crate::vector_store::MemoryVectorStore;
    use std::fs;

    #[tokio::test]
    async fn test_lesson_links_are_searchable_after_indexing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.txt");
        fs::write(
            &path,
            "Course Title: Prompt Compression\n\
             Course Link: https://example.com/compression\n\
             \n\
             Lesson 1: Basics\n\
             Lesson Link: https://example.com/compression/1\n\
             Compression shortens prompts.\n",
        )
        .unwrap();

        let store = Arc::new(CourseStore::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&["compression", "prompt"])),
            5,
        ));
        let indexer = CourseIndexer::new(DocumentProcessor::new(800, 100), store.clone());

        let (course, chunks) = indexer.add_course_document(&path).await.unwrap();
        assert_eq!(course.title, "Prompt Compression");
        assert_eq!(chunks, 1);
        assert_eq!(
            store.lesson_link("Prompt Compression", 1).await.unwrap().as_deref(),
            Some("https://example.com/compression/1")
        );
    }

    #[tokio::test]
    async fn test_failed_content_leaves_no_catalog_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("alpha.txt"),
            "Course Title: Alpha\n\nLesson 1: Start\nAlpha retrieval basics.\n",
        )
        .unwrap();

        let backend: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let processor = || DocumentProcessor::new(800, 100);

        let broken = CourseIndexer::new(
            processor(),
            Arc::new(CourseStore::new(backend.clone(), Arc::new(BatchFailingEmbedder::new(&["alpha"])), 5)),
        );
        let report = broken.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!((report.courses, report.failed), (0, 1));
        assert!(backend.course_titles().await.unwrap().is_empty());
        assert!(broken
            .add_course_document(&dir.path().join("alpha.txt"))
            .await
            .is_err());
        assert!(backend.course_titles().await.unwrap().is_empty());

        let healthy = CourseIndexer::new(
            processor(),
            Arc::new(CourseStore::new(backend.clone(), Arc::new(KeywordEmbedder::new(&["alpha"])), 5)),
        );
        let report = healthy.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!((report.courses, report.skipped), (1, 0));
        assert_eq!(backend.course_titles().await.unwrap(), vec!["Alpha"]);
        assert!(backend.chunk_count().await.unwrap() > 0);
    }
}
