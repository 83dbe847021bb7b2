//! Pre-flight checks before expensive operations.
//!
//! Validates that required API keys are available before starting
//! operations that would otherwise fail midway.

use crate::error::{Result, SyllabusError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Indexing needs embeddings.
    Ingest,
    /// Searching needs an embedding of the query.
    Search,
    /// Answering needs the language model and embeddings.
    Ask,
    /// Listing courses and outlines reads the store only.
    Browse,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Search => {
            check_api_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::Ask => {
            check_api_key("ANTHROPIC_API_KEY", "sk-ant-...")?;
            check_api_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::Browse => {}
    }
    Ok(())
}

/// Check that an API key is present in the environment.
fn check_api_key(var: &str, example: &str) -> Result<()> {
    check_value(var, std::env::var(var).ok().as_deref(), example)
}

fn check_value(var: &str, value: Option<&str>, example: &str) -> Result<()> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(SyllabusError::Config(format!(
            "{var} is empty. Set it with: export {var}='{example}'"
        ))),
        None => Err(SyllabusError::Config(format!(
            "{var} not set. Set it with: export {var}='{example}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_has_no_requirements() {
        assert!(check(Operation::Browse).is_ok());
    }

    #[test]
    fn test_key_messages() {
        assert!(check_value("ANTHROPIC_API_KEY", Some("sk-ant-1"), "sk-ant-...").is_ok());

        let empty = check_value("ANTHROPIC_API_KEY", Some(" "), "sk-ant-...").unwrap_err();
        assert!(empty.to_string().contains("ANTHROPIC_API_KEY is empty"));

        let missing = check_value("OPENAI_API_KEY", None, "sk-...").unwrap_err();
        assert!(missing.to_string().contains("OPENAI_API_KEY not set"));
    }
}
