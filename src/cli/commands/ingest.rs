//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::document::DocumentProcessor;
use crate::rag::CourseIndexer;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the ingest command.
pub async fn run_ingest(path: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = PathBuf::from(shellexpand::tilde(path).to_string());
    if !path.exists() {
        Output::error(&format!("Path not found: {}", path.display()));
        anyhow::bail!("Path not found: {}", path.display());
    }

    let indexer = CourseIndexer::new(
        DocumentProcessor::new(settings.search.chunk_size, settings.search.chunk_overlap),
        Arc::new(super::open_store(&settings)?),
    );

    if path.is_dir() {
        let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
        let report = indexer.add_course_folder(&path, clear).await;
        spinner.finish_and_clear();

        let report = report?;
        Output::success(&format!(
            "Indexed {} courses ({} chunks)",
            report.courses, report.chunks
        ));
        if report.skipped > 0 {
            Output::info(&format!("Skipped {} already indexed courses", report.skipped));
        }
        if report.failed > 0 {
            Output::warning(&format!("{} files could not be indexed (run with -v for details)", report.failed));
        }
    } else {
        if clear {
            indexer.store().clear().await?;
        }

        let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
        let result = indexer.add_course_document(&path).await;
        spinner.finish_and_clear();

        let (course, chunks) = result?;
        Output::success(&format!("Indexed {} ({} chunks)", course.title, chunks));
    }

    let total = indexer.store().course_count().await?;
    Output::kv("Courses in store", &total.to_string());

    Ok(())
}
