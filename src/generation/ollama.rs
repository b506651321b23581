//! Ollama backend (local inference server).

use super::{preview, GenerationOptions, Generator};
use crate::config::BackendSettings;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Timeout for the availability probe.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Timeout for model downloads.
const PULL_TIMEOUT_SECS: u64 = 600;

/// Generator backed by an Ollama server's `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: Url,
    model: String,
    defaults: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
}

impl OllamaGenerator {
    /// Create a generator for `model` on the server at `base_url`.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        // Url::join drops the last path segment unless it ends with a slash.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
            defaults: GenerationOptions::default(),
        })
    }

    /// Create a generator from backend settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        Ok(Self::new(
            &settings.url,
            &settings.model,
            Duration::from_secs(settings.timeout_seconds),
        )?
        .with_defaults(GenerationOptions {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }))
    }

    /// Set the parameters used when a call does not specify its own.
    pub fn with_defaults(mut self, defaults: GenerationOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Base URL of the server.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Check whether the server answers at all.
    pub async fn is_available(&self) -> bool {
        let url = match self.endpoint("api/tags") {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Ollama answered with status {}", response.status());
                false
            }
            Err(e) => {
                warn!("Ollama is not available: {}", e);
                false
            }
        }
    }

    /// List the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint("api/tags")?)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| RecapError::Backend(e.to_string()))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RecapError::BackendStatus {
                status: status.as_u16(),
                body: preview(&body, 200),
            });
        }

        let tags: TagsResponse = serde_json::from_str(&body)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check whether the configured model is installed.
    pub async fn has_model(&self) -> Result<bool> {
        let models = self.list_models().await?;
        let latest = format!("{}:latest", self.model);
        Ok(models.iter().any(|m| *m == self.model || *m == latest))
    }

    /// Download the configured model.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn pull_model(&self) -> Result<()> {
        info!("Pulling model {} (this may take a while)", self.model);

        let response = self
            .client
            .post(self.endpoint("api/pull")?)
            .timeout(Duration::from_secs(PULL_TIMEOUT_SECS))
            .json(&PullRequest {
                name: &self.model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| RecapError::Backend(e.to_string()))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RecapError::BackendStatus {
                status: status.as_u16(),
                body: preview(&body, 200),
            });
        }

        let pulled: PullResponse = serde_json::from_str(&body)?;
        info!("Pull finished: {}", pulled.status);
        Ok(())
    }

    /// Make sure the configured model is installed, pulling it if needed.
    ///
    /// Returns true when a download was performed.
    pub async fn ensure_model(&self) -> Result<bool> {
        if self.has_model().await? {
            debug!("Model {} already available", self.model);
            return Ok(false);
        }
        self.pull_model().await?;
        Ok(true)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, prompt, options), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let options = options.or(self.defaults);
        let model_options = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            })
        } else {
            None
        };

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: model_options,
        };

        let response = self
            .client
            .post(self.endpoint("api/generate")?)
            .json(&request)
            .send()
            .await
            .map_err(|e| RecapError::Generation(format!("request to Ollama failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecapError::Generation(format!("failed to read Ollama response: {}", e)))?;

        if !status.is_success() {
            return Err(RecapError::BackendStatus {
                status: status.as_u16(),
                body: preview(&body, 200),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            RecapError::Generation(format!(
                "malformed Ollama response: {}. Body was: {}",
                e,
                preview(&body, 200)
            ))
        })?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(RecapError::Generation("empty response from Ollama".to_string()));
        }

        debug!("Ollama returned {} chars", text.len());
        Ok(text.to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> OllamaGenerator {
        OllamaGenerator::new(&server.uri(), "llama3.2:3b", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let generator =
            OllamaGenerator::new("http://host:11434/ollama", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(
            generator.endpoint("api/generate").unwrap().as_str(),
            "http://host:11434/ollama/api/generate"
        );
    }

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3.2:3b",
                "prompt": "Summarize this",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2:3b",
                "response": "  A short summary.\n",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = generator(&server).generate("Summarize this").await.unwrap();
        assert_eq!(text, "A short summary.");
    }

    #[tokio::test]
    async fn test_generate_forwards_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "options": { "temperature": 0.5, "num_predict": 2000 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = generator(&server).with_defaults(GenerationOptions {
            temperature: Some(0.9),
            max_tokens: Some(2000),
        });
        let options = GenerationOptions {
            temperature: Some(0.5),
            max_tokens: None,
        };
        let text = generator
            .generate_with_options("prompt", &options)
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_generate_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let err = generator(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, RecapError::BackendStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_generate_malformed_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = generator(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, RecapError::Generation(_)));
    }

    #[tokio::test]
    async fn test_generate_blank_response_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
            .mount(&server)
            .await;

        assert!(generator(&server).generate("prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_generate_timeout_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let generator =
            OllamaGenerator::new(&server.uri(), "llama3.2:3b", Duration::from_millis(50)).unwrap();
        assert!(generator.generate("prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_availability_and_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [ { "name": "llama3.2:3b" }, { "name": "mistral:latest" } ]
            })))
            .mount(&server)
            .await;

        let generator = generator(&server);
        assert!(generator.is_available().await);
        assert!(generator.has_model().await.unwrap());

        let mistral =
            OllamaGenerator::new(&server.uri(), "mistral", Duration::from_secs(5)).unwrap();
        assert!(mistral.has_model().await.unwrap());

        let missing =
            OllamaGenerator::new(&server.uri(), "qwen2.5:7b", Duration::from_secs(5)).unwrap();
        assert!(!missing.has_model().await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!generator(&server).is_available().await);
    }

    #[tokio::test]
    async fn test_ensure_model_pulls_when_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_partial_json(json!({ "name": "llama3.2:3b", "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(generator(&server).ensure_model().await.unwrap());
    }
}
