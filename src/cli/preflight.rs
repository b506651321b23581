//! Pre-flight checks before expensive operations.
//!
//! Validates that the generation backend is usable before starting a batch
//! that would otherwise fail on every call.

use crate::config::{BackendProvider, BackendSettings};
use crate::error::{RecapError, Result};
use crate::generation::OllamaGenerator;
use tracing::info;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Analysis and formatting need a reachable backend with the model installed.
    Generate,
    /// Pulling needs a reachable Ollama server.
    Pull,
}

/// Outcome of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    /// Everything was already in place.
    Ready,
    /// The model was missing and has been downloaded.
    ModelPulled,
}

/// Run pre-flight checks for the given operation.
///
/// Returns an error describing what's missing.
pub async fn check(operation: Operation, backend: &BackendSettings) -> Result<Preflight> {
    match (backend.provider, operation) {
        (BackendProvider::OpenAI, Operation::Generate) => {
            check_api_key()?;
            Ok(Preflight::Ready)
        }
        (BackendProvider::OpenAI, Operation::Pull) => Err(RecapError::Config(
            "Models can only be pulled for the ollama provider".to_string(),
        )),
        (BackendProvider::Ollama, operation) => {
            let ollama = OllamaGenerator::from_settings(backend)?;
            check_ollama(&ollama).await?;

            if operation == Operation::Pull {
                return Ok(Preflight::Ready);
            }

            if ollama.ensure_model().await? {
                info!("Model {} was pulled during preflight", backend.model);
                Ok(Preflight::ModelPulled)
            } else {
                Ok(Preflight::Ready)
            }
        }
    }
}

/// Check that the Ollama server answers.
async fn check_ollama(ollama: &OllamaGenerator) -> Result<()> {
    if ollama.is_available().await {
        Ok(())
    } else {
        Err(RecapError::Backend(format!(
            "Ollama is not reachable at {}. Start it with: ollama serve",
            ollama.base_url()
        )))
    }
}

/// Check if OpenAI API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(RecapError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(RecapError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> BackendSettings {
        BackendSettings {
            url: server.uri(),
            ..Default::default()
        }
    }

    async fn mount_tags(server: &MockServer, models: &[&str]) {
        let models: Vec<_> = models.iter().map(|name| json!({ "name": name })).collect();
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_ready_when_model_installed() {
        let server = MockServer::start().await;
        mount_tags(&server, &["llama3.2:3b"]).await;

        let outcome = check(Operation::Generate, &backend(&server)).await.unwrap();
        assert_eq!(outcome, Preflight::Ready);
    }

    #[tokio::test]
    async fn test_missing_model_is_pulled() {
        let server = MockServer::start().await;
        mount_tags(&server, &["mistral:latest"]).await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = check(Operation::Generate, &backend(&server)).await.unwrap();
        assert_eq!(outcome, Preflight::ModelPulled);
    }

    #[tokio::test]
    async fn test_pull_only_needs_server() {
        let server = MockServer::start().await;
        mount_tags(&server, &[]).await;

        let outcome = check(Operation::Pull, &backend(&server)).await.unwrap();
        assert_eq!(outcome, Preflight::Ready);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = check(Operation::Generate, &backend(&server)).await.unwrap_err();
        assert!(matches!(err, RecapError::Backend(_)));
    }

    #[tokio::test]
    async fn test_openai_cannot_pull() {
        let settings = BackendSettings {
            provider: BackendProvider::OpenAI,
            ..Default::default()
        };
        assert!(check(Operation::Pull, &settings).await.is_err());
    }
}
