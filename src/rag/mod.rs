//! Question answering over indexed course materials.
//!
//! [`RagSystem`] wires the document processor, course store, tools,
//! generator and sessions together and is the entry point for the CLI and
//! the HTTP server.

mod indexer;
mod system;

pub use indexer::CourseIndexer;
pub use system::RagSystem;

use crate::tools::SourceCitation;
use serde::{Deserialize, Serialize};

/// Answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    /// Sources cited by the tools while answering.
    pub sources: Vec<SourceCitation>,
    pub session_id: String,
}

/// Summary of the course catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Outcome of indexing a folder of course documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub courses: usize,
    pub chunks: usize,
    /// Files whose course was already indexed.
    pub skipped: usize,
    pub failed: usize,
}
