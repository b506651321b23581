//! OpenAI chat completions backend.

use super::{GenerationOptions, Generator};
use crate::config::BackendSettings;
use crate::error::{RecapError, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Create an OpenAI client with a custom timeout.
///
/// `api_base` points the client at an OpenAI-compatible server instead of
/// api.openai.com. The key is still read from `OPENAI_API_KEY`.
pub fn create_client_with_timeout(
    timeout: Duration,
    api_base: Option<&str>,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new();
    if let Some(base) = api_base.map(str::trim).filter(|b| !b.is_empty()) {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Generator backed by the OpenAI chat completions API.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    defaults: GenerationOptions,
}

impl OpenAIGenerator {
    /// Create a generator for `model` with the given per-call timeout.
    pub fn new(model: &str, timeout: Duration, api_base: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout, api_base)?,
            model: model.to_string(),
            defaults: GenerationOptions::default(),
        })
    }

    /// Create a generator from backend settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let mut generator = Self::new(
            &settings.model,
            Duration::from_secs(settings.timeout_seconds),
            settings.api_base.as_deref(),
        )?;
        generator.defaults = GenerationOptions {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        };
        Ok(generator)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt, options), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let options = options.or(self.defaults);

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| RecapError::Generation(e.to_string()))?
                .into()];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if let Some(temperature) = options.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        let request = args
            .build()
            .map_err(|e| RecapError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| RecapError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RecapError::Generation("Empty response from LLM".to_string()))?;

        debug!("OpenAI returned {} chars", content.len());
        Ok(content.to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
