//! Course outline tool.

use super::{required_str, ParamKind, SourceCitation, Tool, ToolDefinition, ToolError, ToolOutput, ToolParameter};
use crate::document::Course;
use crate::vector_store::CourseStore;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Returns a course's title, instructor, link and lesson list.
pub struct OutlineTool {
    store: Arc<CourseStore>,
}

impl OutlineTool {
    pub const NAME: &'static str = "get_course_outline";

    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }
}

fn render_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course: {}", course.title)];
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Instructor: {}", instructor));
    }
    if let Some(link) = &course.course_link {
        lines.push(format!("Course Link: {}", link));
    }

    if course.lessons.is_empty() {
        lines.push("\nNo lessons found".to_string());
    } else {
        lines.push("\nLessons:".to_string());
        for lesson in &course.lessons {
            lines.push(format!("  Lesson {}: {}", lesson.lesson_number, lesson.title));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for OutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get the complete outline of a course: title, link, instructor and every lesson"
                .to_string(),
            parameters: vec![ToolParameter::required(
                "course_name",
                ParamKind::String,
                "Course title (partial matches work, e.g. 'MCP', 'Computer Use')",
            )],
        }
    }

    #[instrument(skip(self, params))]
    async fn execute(&self, params: &Value) -> Result<ToolOutput, ToolError> {
        let course_name = required_str(params, "course_name")?;

        let title = match self.store.resolve_course_name(course_name).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                return Ok(ToolOutput::text(format!(
                    "No course found matching '{}'",
                    course_name
                )))
            }
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                warn!("Course lookup failed: {}", e);
                return Ok(ToolOutput::text(format!("Error retrieving course outline: {}", e)));
            }
        };

        let course = match self.store.course_metadata(&title).await {
            Ok(Some(course)) => course,
            Ok(None) => {
                return Ok(ToolOutput::text(format!(
                    "Course metadata not found for '{}'",
                    title
                )))
            }
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                warn!("Course metadata lookup failed: {}", e);
                return Ok(ToolOutput::text(format!("Error retrieving course outline: {}", e)));
            }
        };

        let citation = SourceCitation::new(
            format!("{} - Course Outline", course.title),
            course.course_link.clone(),
        );
        Ok(ToolOutput::with_citations(render_outline(&course), vec![citation]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Lesson;
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use serde_json::json;

    async fn store_with(courses: &[Course]) -> Arc<CourseStore> {
        let store = CourseStore::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&["mcp", "computer"])),
            5,
        );
        for course in courses {
            store.add_course_metadata(course).await.unwrap();
        }
        Arc::new(store)
    }

    fn mcp_course() -> Course {
        Course {
            title: "MCP: Build Rich-Context AI Apps".to_string(),
            course_link: Some("https://example.com/mcp".to_string()),
            instructor: Some("Elie Schoppik".to_string()),
            lessons: vec![
                Lesson {
                    lesson_number: 0,
                    title: "Introduction".to_string(),
                    lesson_link: None,
                },
                Lesson {
                    lesson_number: 1,
                    title: "Why MCP".to_string(),
                    lesson_link: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_outline_for_partial_name() {
        let tool = OutlineTool::new(store_with(&[mcp_course()]).await);
        let output = tool.execute(&json!({"course_name": "mcp"})).await.unwrap();

        assert_eq!(
            output.text,
            "Course: MCP: Build Rich-Context AI Apps\n\
             Instructor: Elie Schoppik\n\
             Course Link: https://example.com/mcp\n\
             \n\
             Lessons:\n  Lesson 0: Introduction\n  Lesson 1: Why MCP"
        );
        assert_eq!(
            output.citations,
            vec![SourceCitation::new(
                "MCP: Build Rich-Context AI Apps - Course Outline",
                Some("https://example.com/mcp".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_outline_without_lessons() {
        let tool = OutlineTool::new(store_with(&[Course::new("Bare Course")]).await);
        let output = tool.execute(&json!({"course_name": "Bare Course"})).await.unwrap();

        assert_eq!(output.text, "Course: Bare Course\n\nNo lessons found");
        assert_eq!(output.citations, vec![SourceCitation::new("Bare Course - Course Outline", None)]);
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let tool = OutlineTool::new(store_with(&[mcp_course()]).await);
        let output = tool.execute(&json!({"course_name": "Zzz"})).await.unwrap();

        assert!(output.text.contains("No course found matching 'Zzz'"));
        assert!(output.citations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let tool = OutlineTool::new(store_with(&[]).await);
        let err = tool.execute(&json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
