//! Content search tool.

use super::{
    optional_str, optional_u32, required_str, ParamKind, SourceCitation, Tool, ToolDefinition,
    ToolError, ToolOutput, ToolParameter,
};
use crate::vector_store::{CourseStore, SearchHit};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Searches indexed course content, optionally within one course or lesson.
pub struct ContentSearchTool {
    store: Arc<CourseStore>,
}

impl ContentSearchTool {
    pub const NAME: &'static str = "search_course_content";

    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }

    async fn format_hits(&self, hits: &[SearchHit]) -> (String, Vec<SourceCitation>) {
        let mut sections = Vec::with_capacity(hits.len());
        let mut citations = Vec::with_capacity(hits.len());

        for hit in hits {
            let label = match hit.lesson_number {
                Some(n) => format!("{} - Lesson {}", hit.course_title, n),
                None => hit.course_title.clone(),
            };

            let link = match hit.lesson_number {
                // A missing link should not hide the content itself.
                Some(n) => match self.store.lesson_link(&hit.course_title, n).await {
                    Ok(link) => link,
                    Err(e) => {
                        warn!("Lesson link lookup failed for {}: {}", label, e);
                        None
                    }
                },
                None => None,
            };

            sections.push(format!("[{}]\n{}", label, hit.content));
            citations.push(SourceCitation::new(label, link));
        }

        (sections.join("\n\n"), citations)
    }
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for ContentSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            parameters: vec![
                ToolParameter::required(
                    "query",
                    ParamKind::String,
                    "What to search for in the course content",
                ),
                ToolParameter::optional(
                    "course_name",
                    ParamKind::String,
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                ),
                ToolParameter::optional(
                    "lesson_number",
                    ParamKind::Integer,
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
            ],
        }
    }

    #[instrument(skip(self, params))]
    async fn execute(&self, params: &Value) -> Result<ToolOutput, ToolError> {
        let query = required_str(params, "query")?;
        let course_name = optional_str(params, "course_name");
        let lesson_number = optional_u32(params, "lesson_number")?;

        let results = self.store.search(query, course_name, lesson_number).await?;

        if let Some(error) = results.error {
            return Ok(ToolOutput::text(error));
        }
        if results.is_empty() {
            return Ok(ToolOutput::text(no_results_message(course_name, lesson_number)));
        }

        debug!("Formatting {} hits", results.hits.len());
        let (text, citations) = self.format_hits(&results.hits).await;
        Ok(ToolOutput::with_citations(text, citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Course, CourseChunk, Lesson};
    use crate::testing::{FailingEmbedder, KeywordEmbedder};
    use crate::error::SyllabusError;
    use crate::vector_store::{
        ChunkFilter, ChunkRecord, CourseMatch, CourseRecord, MemoryVectorStore, ScoredChunk,
        VectorStore,
    };
    use serde_json::json;

    const TITLE: &str = "Introduction to Retrieval";

    fn keyword_store(backend: Arc<dyn VectorStore>) -> CourseStore {
        CourseStore::new(
            backend,
            Arc::new(KeywordEmbedder::new(&["retrieval", "embedding", "chunk"])),
            5,
        )
    }

    async fn tool_with_content() -> ContentSearchTool {
        let backend = Arc::new(MemoryVectorStore::new());
        index_content(&keyword_store(backend.clone())).await;
        ContentSearchTool::new(Arc::new(keyword_store(backend)))
    }

    async fn index_content(store: &CourseStore) {
        let mut course = Course::new(TITLE);
        course.lessons.push(Lesson {
            lesson_number: 1,
            title: "Embeddings".to_string(),
            lesson_link: Some("https://example.com/retrieval/1".to_string()),
        });
        store.add_course_metadata(&course).await.unwrap();
        store
            .add_course_content(&[
                CourseChunk {
                    content: "An embedding maps text to vectors.".to_string(),
                    course_title: TITLE.to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                },
                CourseChunk {
                    content: "Chunk documents before retrieval.".to_string(),
                    course_title: TITLE.to_string(),
                    lesson_number: None,
                    chunk_index: 1,
                },
            ])
            .await
            .unwrap();
    }

    /// Serves chunks from an in-memory store but cannot read the catalog.
    struct CatalogOffline(MemoryVectorStore);

    #[async_trait]
    impl VectorStore for CatalogOffline {
        async fn upsert_course(&self, record: &CourseRecord) -> crate::error::Result<()> {
            self.0.upsert_course(record).await
        }

        async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> crate::error::Result<usize> {
            self.0.upsert_chunks(chunks).await
        }

        async fn search_chunks(
            &self,
            query_embedding: &[f32],
            filter: &ChunkFilter,
            limit: usize,
        ) -> crate::error::Result<Vec<ScoredChunk>> {
            self.0.search_chunks(query_embedding, filter, limit).await
        }

        async fn search_courses(
            &self,
            query_embedding: &[f32],
            limit: usize,
        ) -> crate::error::Result<Vec<CourseMatch>> {
            self.0.search_courses(query_embedding, limit).await
        }

        async fn get_course(&self, _title: &str) -> crate::error::Result<Option<Course>> {
            Err(SyllabusError::Unavailable("catalog offline".to_string()))
        }

        async fn course_titles(&self) -> crate::error::Result<Vec<String>> {
            self.0.course_titles().await
        }

        async fn delete_course(&self, title: &str) -> crate::error::Result<usize> {
            self.0.delete_course(title).await
        }

        async fn chunk_count(&self) -> crate::error::Result<usize> {
            self.0.chunk_count().await
        }

        async fn clear(&self) -> crate::error::Result<()> {
            self.0.clear().await
        }
    }

    #[tokio::test]
    async fn test_formats_hits_with_citations() {
        let tool = tool_with_content().await;
        let output = tool.execute(&json!({"query": "embedding"})).await.unwrap();

        assert_eq!(
            output.text,
            "[Introduction to Retrieval - Lesson 1]\nAn embedding maps text to vectors.\n\n\
             [Introduction to Retrieval]\nChunk documents before retrieval."
        );
        assert_eq!(
            output.citations,
            vec![
                SourceCitation::new(
                    "Introduction to Retrieval - Lesson 1",
                    Some("https://example.com/retrieval/1".to_string())
                ),
                SourceCitation::new("Introduction to Retrieval", None),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_link_lookup_keeps_content() {
        let backend = Arc::new(CatalogOffline(MemoryVectorStore::new()));
        let store = keyword_store(backend);
        index_content(&store).await;
        let tool = ContentSearchTool::new(Arc::new(store));

        let output = tool.execute(&json!({"query": "embedding"})).await.unwrap();
        assert!(output
            .text
            .starts_with("[Introduction to Retrieval - Lesson 1]\nAn embedding maps text to vectors."));
        assert_eq!(
            output.citations[0],
            SourceCitation::new("Introduction to Retrieval - Lesson 1", None)
        );
    }

    #[tokio::test]
    async fn test_empty_results_message() {
        let tool = tool_with_content().await;
        let output = tool
            .execute(&json!({"query": "embedding", "course_name": "Retrieval", "lesson_number": 3}))
            .await
            .unwrap();
        assert_eq!(output.text, "No relevant content found in course 'Retrieval' in lesson 3.");
        assert!(output.citations.is_empty());

        assert_eq!(no_results_message(None, None), "No relevant content found.");
        assert_eq!(
            no_results_message(Some("X"), Some(3)),
            "No relevant content found in course 'X' in lesson 3."
        );
    }

    #[tokio::test]
    async fn test_store_error_is_returned_verbatim() {
        let tool = tool_with_content().await;
        let output = tool
            .execute(&json!({"query": "embedding", "course_name": "Zzz"}))
            .await
            .unwrap();
        assert_eq!(output.text, "No course found matching 'Zzz'");
    }

    #[tokio::test]
    async fn test_invalid_and_transient_failures() {
        let tool = tool_with_content().await;
        let err = tool.execute(&json!({"course_name": "x"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));

        let store = CourseStore::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(FailingEmbedder { transient: true }),
            5,
        );
        let tool = ContentSearchTool::new(Arc::new(store));
        let err = tool.execute(&json!({"query": "x"})).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_definition() {
        let store = CourseStore::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&[])),
            5,
        );
        let def = ContentSearchTool::new(Arc::new(store)).definition();
        assert_eq!(def.name, "search_course_content");
        let required: Vec<_> = def.parameters.iter().filter(|p| p.required).map(|p| p.name.as_str()).collect();
        assert_eq!(required, vec!["query"]);
    }
}
