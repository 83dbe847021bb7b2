//! CLI module for Syllabus.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Syllabus - Ask questions about your course materials
///
/// Indexes course documents into a searchable knowledge base and answers
/// questions with an AI assistant that searches the courses for you.
#[derive(Parser, Debug)]
#[command(name = "syllabus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a course document or a folder of course documents
    Ingest {
        /// File or folder to index (.txt, .pdf, .docx)
        path: String,

        /// Remove all indexed courses before indexing
        #[arg(long)]
        clear: bool,
    },

    /// Ask a question about the indexed courses
    Ask {
        /// The question to ask
        question: String,
    },

    /// Start an interactive chat session
    Chat,

    /// Search course content without asking the assistant
    Search {
        /// Search query
        query: String,

        /// Restrict to a course (partial names work)
        #[arg(long)]
        course: Option<String>,

        /// Restrict to a lesson number
        #[arg(long)]
        lesson: Option<u32>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the outline of a course
    Outline {
        /// Course title (partial names work)
        course: String,
    },

    /// List indexed courses
    Courses,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Folder of course documents to index at startup
        #[arg(long)]
        docs: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_filters() {
        let cli = Cli::parse_from([
            "syllabus", "-vv", "search", "what is mcp", "--course", "MCP", "--lesson", "2",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search {
                query,
                course,
                lesson,
                limit,
            } => {
                assert_eq!(query, "what is mcp");
                assert_eq!(course.as_deref(), Some("MCP"));
                assert_eq!(lesson, Some(2));
                assert_eq!(limit, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_action() {
        let cli = Cli::parse_from(["syllabus", "--config", "/tmp/c.toml", "config", "path"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/c.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
