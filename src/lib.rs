//! Syllabus - Ask questions about your course materials
//!
//! A retrieval-augmented assistant for course documents: it indexes course
//! files into a searchable store and answers questions with a language model
//! that searches the courses through tools.
//!
//! # Overview
//!
//! Syllabus allows you to:
//! - Index course documents with their lessons and links
//! - Search course content semantically, filtered by course and lesson
//! - Ask questions and get answers with lesson citations
//! - Serve the assistant over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompts
//! - `document` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content storage
//! - `tools` - Tools the model can call (content search, course outline)
//! - `llm` - Language model client and wire types
//! - `agent` - Bounded tool-calling generation loop
//! - `session` - Conversation history
//! - `rag` - Query coordination and indexing
//!
//! # Example
//!
//! ```rust,no_run
//! use syllabus::config::Settings;
//! use syllabus::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::new(&settings)?;
//!
//!     rag.add_course_folder("docs".as_ref(), false).await?;
//!     let response = rag.query("What does lesson 2 of the MCP course cover?", None).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod rag;
pub mod session;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, SyllabusError};
