//! Course documents: models, parsing and chunking.
//!
//! A course file starts with a small header (`Course Title:`, `Course Link:`,
//! `Course Instructor:`) followed by `Lesson N: Title` sections, each
//! optionally followed by a `Lesson Link:` line.

mod chunker;
mod parser;

pub use chunker::{split_sentences, TextChunker};
pub use parser::{DocumentProcessor, SUPPORTED_EXTENSIONS};

use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: u32,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// Course metadata. The title doubles as the course identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Look up a lesson by number.
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == lesson_number)
    }
}

/// A piece of course text ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Position of this chunk within the whole document.
    pub chunk_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_lookup() {
        let mut course = Course::new("Rust Basics");
        course.lessons.push(Lesson {
            lesson_number: 2,
            title: "Ownership".to_string(),
            lesson_link: Some("https://example.com/rust/2".to_string()),
        });

        assert_eq!(course.lesson(2).map(|l| l.title.as_str()), Some("Ownership"));
        assert!(course.lesson(1).is_none());
    }

    #[test]
    fn test_course_deserializes_with_defaults() {
        let course: Course = serde_json::from_str(r#"{"title": "Bare"}"#).unwrap();
        assert_eq!(course, Course::new("Bare"));
    }
}
