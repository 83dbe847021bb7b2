//! Prompt templates for Syllabus.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub generator: GeneratorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorPrompts {
    /// Behavioral instruction sent as the system prompt.
    /// `{{max_rounds}}` is replaced with the configured round limit.
    pub system: String,
}

impl Default for GeneratorPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content. You can search the indexed courses with tools.

Tools:
- search_course_content: find passages in course material. Use it for questions about what a course or lesson teaches.
- get_course_outline: fetch a course's title, link, instructor and lesson list. Use it for questions about course structure.
- You may call tools in up to {{max_rounds}} separate rounds. Use earlier results to choose the parameters of later calls.
- Base answers on tool results. If a search finds nothing, say so plainly without suggesting alternatives.

Answering:
- General knowledge questions need no tools.
- For outline questions include the course title, the course link if known and every lesson with its number and title.
- Give the answer directly. Do not describe your searches or reasoning.
- Keep answers brief and clear, with an example when it helps understanding."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let generator_path = custom_path.join("generator.toml");
            if generator_path.exists() {
                let content = std::fs::read_to_string(&generator_path)?;
                prompts.generator = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The generator system prompt for a given round limit.
    pub fn generator_system(&self, max_rounds: u32) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_rounds".to_string(), max_rounds.to_string());
        self.render_with_custom(&self.generator.system, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_mentions_tools() {
        let prompts = Prompts::default();
        assert!(prompts.generator.system.contains("search_course_content"));
        assert!(prompts.generator.system.contains("get_course_outline"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        assert_eq!(Prompts::render(template, &vars), "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_generator_system_renders_rounds() {
        let prompts = Prompts::default();
        let system = prompts.generator_system(3);
        assert!(system.contains("up to 3 separate rounds"));
        assert!(!system.contains("{{max_rounds}}"));
    }

    #[test]
    fn test_custom_prompt_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("generator.toml"),
            "system = \"Answer for {{audience}} in {{max_rounds}} rounds.\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("audience".to_string(), "beginners".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        assert_eq!(prompts.generator_system(2), "Answer for beginners in 2 rounds.");
    }
}
