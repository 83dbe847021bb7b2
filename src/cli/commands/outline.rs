//! Outline command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = super::open_store(&settings)?;

    let Some(title) = store.resolve_course_name(course).await? else {
        Output::warning(&format!("No course found matching '{}'", course));
        return Ok(());
    };

    let Some(course) = store.course_metadata(&title).await? else {
        Output::warning(&format!("Course metadata not found for '{}'", title));
        return Ok(());
    };

    Output::header(&course.title);
    if let Some(instructor) = &course.instructor {
        Output::kv("Instructor", instructor);
    }
    if let Some(link) = &course.course_link {
        Output::kv("Link", link);
    }

    if course.lessons.is_empty() {
        Output::info("No lessons found");
    } else {
        println!();
        for lesson in &course.lessons {
            Output::list_item(&format!("Lesson {}: {}", lesson.lesson_number, lesson.title));
        }
    }

    Ok(())
}
