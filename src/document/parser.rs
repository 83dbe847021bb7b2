//! Course file parsing.

use super::{Course, CourseChunk, Lesson, TextChunker};
use crate::error::{Result, SyllabusError};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// File extensions picked up by folder ingestion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "pdf", "docx"];

struct Patterns {
    title: Regex,
    link: Regex,
    instructor: Regex,
    lesson: Regex,
    lesson_link: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        title: Regex::new(r"(?i)^Course Title:\s*(.+)$").expect("valid title regex"),
        link: Regex::new(r"(?i)^Course Link:\s*(.+)$").expect("valid link regex"),
        instructor: Regex::new(r"(?i)^Course Instructor:\s*(.+)$").expect("valid instructor regex"),
        lesson: Regex::new(r"(?i)^Lesson\s+(\d+):\s*(.+)$").expect("valid lesson regex"),
        lesson_link: Regex::new(r"(?i)^Lesson Link:\s*(.+)$").expect("valid lesson link regex"),
    })
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A lesson section collected while scanning the body.
struct Section<'a> {
    lesson: Lesson,
    lines: Vec<&'a str>,
}

/// Turns course files into course metadata and embeddable chunks.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunker: TextChunker,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap),
        }
    }

    /// Whether folder ingestion should pick up this file.
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Read a file as text, replacing invalid UTF-8 sequences.
    pub fn read_file(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read and parse a course file.
    #[instrument(skip(self))]
    pub fn process_file(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SyllabusError::Document(format!("Invalid file name: {:?}", path)))?;

        let content = Self::read_file(path)?;
        Ok(self.parse(&content, file_name))
    }

    /// Parse course text. `file_name` is the title of last resort.
    pub fn parse(&self, content: &str, file_name: &str) -> (Course, Vec<CourseChunk>) {
        let p = patterns();
        let lines: Vec<&str> = content.trim().lines().collect();

        let Some(first) = lines.first() else {
            return (Course::new(file_name), Vec::new());
        };

        let title = capture(&p.title, first)
            .or_else(|| Some(first.trim().to_string()).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| file_name.to_string());
        let mut course = Course::new(title);

        // Header block: up to three lines after the title.
        let mut body_start = 1;
        for (idx, line) in lines.iter().enumerate().skip(1).take(3) {
            if line.trim().is_empty() {
                body_start = idx + 1;
            } else if let Some(link) = capture(&p.link, line) {
                course.course_link = Some(link);
                body_start = idx + 1;
            } else if let Some(instructor) = capture(&p.instructor, line) {
                course.instructor = Some(instructor);
                body_start = idx + 1;
            } else {
                break;
            }
        }

        let mut preamble: Vec<&str> = Vec::new();
        let mut sections: Vec<Section> = Vec::new();
        let mut body = lines[body_start.min(lines.len())..].iter().copied().peekable();

        while let Some(line) = body.next() {
            let lesson = p.lesson.captures(line.trim()).and_then(|caps| {
                let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
                Some((number, caps.get(2)?.as_str().trim().to_string()))
            });

            if let Some((lesson_number, title)) = lesson {
                let lesson_link = body.peek().and_then(|next| capture(&p.lesson_link, next));
                if lesson_link.is_some() {
                    body.next();
                }
                sections.push(Section {
                    lesson: Lesson {
                        lesson_number,
                        title,
                        lesson_link,
                    },
                    lines: Vec::new(),
                });
            } else if let Some(section) = sections.last_mut() {
                section.lines.push(line);
            } else {
                preamble.push(line);
            }
        }

        let mut chunks = Vec::new();
        if sections.is_empty() {
            for piece in self.chunker.chunk(&preamble.join("\n")) {
                let chunk_index = chunks.len();
                chunks.push(CourseChunk {
                    content: piece,
                    course_title: course.title.clone(),
                    lesson_number: None,
                    chunk_index,
                });
            }
        } else {
            if preamble.iter().any(|l| !l.trim().is_empty()) {
                debug!("Ignoring text before the first lesson in {}", file_name);
            }
            for section in sections {
                let number = section.lesson.lesson_number;
                for piece in self.chunker.chunk(&section.lines.join("\n")) {
                    let chunk_index = chunks.len();
                    chunks.push(CourseChunk {
                        content: format!("Course {} Lesson {} content: {}", course.title, number, piece),
                        course_title: course.title.clone(),
                        lesson_number: Some(number),
                        chunk_index,
                    });
                }
                course.lessons.push(section.lesson);
            }
        }

        debug!(
            "Parsed course '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );
        (course, chunks)
    }
}
