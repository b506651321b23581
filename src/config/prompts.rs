//! Prompt templates for Recap.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub key_points: KeyPointPrompts,
    pub topics: TopicPrompts,
    /// Prompt for making raw transcripts readable.
    pub formatting: FormattingPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the executive summary.
///
/// `single` is used when the whole transcription fits in one chunk,
/// `partial` for each chunk otherwise, and `reduce` to merge the partials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub single: String,
    pub partial: String,
    pub reduce: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            single: r#"Write an executive summary of the following transcription.
The summary must:
- Capture the main ideas
- Be concise but complete (3-5 paragraphs)
- Keep the most relevant information
- Be written in {{language}}

Transcription:
{{text}}

Executive summary:"#
                .to_string(),

            partial: r#"Briefly summarize the following transcription fragment:

{{text}}

Brief summary:"#
                .to_string(),

            reduce: r#"Write one cohesive executive summary based on these partial summaries:

{{partials}}

Final executive summary (3-5 paragraphs, in {{language}}):"#
                .to_string(),
        }
    }
}

/// Prompts for key point extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPointPrompts {
    pub extract: String,
    pub consolidate: String,
}

impl Default for KeyPointPrompts {
    fn default() -> Self {
        Self {
            extract: r#"Extract the most important key points from the following transcription.

Instructions:
- List the points as bullets (•)
- Include only relevant, specific information
- At most 10 points
- Be concise but clear
- Write in {{language}}

Transcription:
{{text}}

Key points:"#
                .to_string(),

            consolidate: r#"Consolidate the following key points into a single list without duplicates.

Instructions:
- Merge points that say the same thing
- Order the points by relevance (most important first)
- At most 15 points, as bullets (•)
- Write in {{language}}

{{partials}}

Consolidated key points:"#
                .to_string(),
        }
    }
}

/// Prompt for topic identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicPrompts {
    pub extract: String,
}

impl Default for TopicPrompts {
    fn default() -> Self {
        Self {
            extract: r#"Analyze the following transcription and identify its main topics.

Instructions:
- List between 3 and 8 main topics
- Format each topic as "Topic: short description"
- Order by relevance (most important first)
- Be specific and clear
- Write in {{language}}

Transcription:
{{text}}

Main topics:"#
                .to_string(),
        }
    }
}

/// Prompt for transcript formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingPrompts {
    pub user: String,
}

impl Default for FormattingPrompts {
    fn default() -> Self {
        Self {
            user: r#"Format the following audio transcription to make it easier to read:

RULES:
1. Split the text into coherent paragraphs
2. Add correct punctuation (periods, commas, capital letters)
3. Fix obvious grammatical errors
4. Do NOT summarize, keep all of the content
5. Do NOT add new information
6. Use a blank line between paragraphs

TRANSCRIPTION:
{{text}}

FORMATTED TEXT:"#
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

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let key_points_path = custom_path.join("key_points.toml");
            if key_points_path.exists() {
                let content = std::fs::read_to_string(&key_points_path)?;
                prompts.key_points = toml::from_str(&content)?;
            }

            let topics_path = custom_path.join("topics.toml");
            if topics_path.exists() {
                let content = std::fs::read_to_string(&topics_path)?;
                prompts.topics = toml::from_str(&content)?;
            }

            let formatting_path = custom_path.join("formatting.toml");
            if formatting_path.exists() {
                let content = std::fs::read_to_string(&formatting_path)?;
                prompts.formatting = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Set a variable available in every rendered prompt.
    pub fn with_variable(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template: placeholders that
    /// appear inside substituted values are left as they are, and unknown
    /// placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => match vars.get(&after[..end]) {
                    Some(value) => {
                        result.push_str(value);
                        rest = &after[end + 2..];
                    }
                    None => {
                        result.push_str("{{");
                        rest = after;
                    }
                },
                None => {
                    result.push_str(rest);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
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

    /// Render a template whose only per-call variable is `name`.
    pub fn render_one(&self, template: &str, name: &str, value: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert(name.to_string(), value.to_string());
        self.render_with_custom(template, &vars)
    }
}
