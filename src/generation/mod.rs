//! Text generation backends.
//!
//! A [`Generator`] takes one prompt and returns the generated text, or an
//! error when the backend could not produce any. Callers decide whether a
//! failure is skipped or propagated; nothing is retried here.

mod ollama;
mod openai;

pub use ollama::OllamaGenerator;
pub use openai::{create_client_with_timeout, OpenAIGenerator};

use crate::config::{BackendProvider, BackendSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-call generation parameters. Unset fields fall back to the backend's
/// configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Fill unset fields from `defaults`.
    pub fn or(self, defaults: GenerationOptions) -> Self {
        Self {
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
        }
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for a prompt with explicit parameters.
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;

    /// Generate text for a prompt with the backend's default parameters.
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_options(prompt, &GenerationOptions::default())
            .await
    }

    /// Model identifier used for generation.
    fn model(&self) -> &str;
}

/// Create a generator for the configured backend.
pub fn create_generator(settings: &BackendSettings) -> Result<Arc<dyn Generator>> {
    match settings.provider {
        BackendProvider::Ollama => Ok(Arc::new(OllamaGenerator::from_settings(settings)?)),
        BackendProvider::OpenAI => Ok(Arc::new(OpenAIGenerator::from_settings(settings)?)),
    }
}

/// Shorten backend output for log lines and error messages.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_fall_back_to_defaults() {
        let defaults = GenerationOptions {
            temperature: Some(0.7),
            max_tokens: Some(512),
        };
        let call = GenerationOptions {
            temperature: Some(0.1),
            max_tokens: None,
        };

        let merged = call.or(defaults);
        assert_eq!(merged.temperature, Some(0.1));
        assert_eq!(merged.max_tokens, Some(512));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("añadir más", 3), "aña...");
    }

    #[test]
    fn test_create_generator_for_ollama() {
        let settings = BackendSettings::default();
        let generator = create_generator(&settings).unwrap();
        assert_eq!(generator.model(), "llama3.2:3b");
    }
}
