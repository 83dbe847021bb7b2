//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse)?;
    let store = super::open_store(&settings)?;

    let titles = store.course_titles().await?;
    if titles.is_empty() {
        Output::info("No courses indexed yet. Run 'syllabus ingest <folder>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", titles.len()));
    for title in &titles {
        Output::list_item(title);
    }

    let chunks = store.chunk_count().await?;
    println!();
    Output::kv("Total chunks", &chunks.to_string());

    Ok(())
}
