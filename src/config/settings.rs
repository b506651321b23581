//! Configuration settings for Recap.

use crate::error::{RecapError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub backend: BackendSettings,
    pub analysis: AnalysisSettings,
    pub source: SourceSettings,
    pub output: OutputSettings,
    pub formatting: FormattingSettings,
    pub transcription: TranscriptionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where analysis results are written.
    pub output_dir: String,
    /// Log level without -v flags (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./output".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Text-generation backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server (default).
    #[default]
    Ollama,
    /// OpenAI chat completions API, or a compatible server via `api_base`.
    OpenAI,
}

impl std::str::FromStr for BackendProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(BackendProvider::Ollama),
            "openai" => Ok(BackendProvider::OpenAI),
            _ => Err(format!("Unknown backend provider: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendProvider::Ollama => write!(f, "ollama"),
            BackendProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Backend provider (ollama, openai).
    pub provider: BackendProvider,
    /// Base URL of the Ollama server (ignored for openai).
    pub url: String,
    /// Base URL of an OpenAI-compatible API (openai only, api.openai.com when unset).
    pub api_base: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature (backend default when unset).
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate (backend default when unset).
    pub max_tokens: Option<u32>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            provider: BackendProvider::Ollama,
            url: "http://localhost:11434".to_string(),
            api_base: None,
            model: "llama3.2:3b".to_string(),
            timeout_seconds: 300,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// What to do when the consolidation call of a multi-chunk analysis fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReduceFailure {
    /// Omit the analysis kind from the result.
    #[default]
    Drop,
    /// Return the partial results joined by blank lines.
    Concatenate,
}

impl std::str::FromStr for ReduceFailure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(ReduceFailure::Drop),
            "concatenate" | "concat" => Ok(ReduceFailure::Concatenate),
            _ => Err(format!("Unknown reduce failure policy: {}", s)),
        }
    }
}

/// Analysis pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Maximum chunk size in characters for summary and key points.
    pub max_chunk_size: usize,
    /// Characters taken from each end of the text for topic extraction.
    pub sample_size: usize,
    /// Generate an executive summary.
    pub summary: bool,
    /// Extract key points.
    pub key_points: bool,
    /// Identify main topics.
    pub topics: bool,
    /// Maximum concurrent generation calls per map stage (1 = sequential).
    pub max_concurrent: usize,
    /// Policy when the consolidation call fails.
    pub on_reduce_failure: ReduceFailure,
    /// Output language, substituted into prompts as {{language}}.
    pub language: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 15000,
            sample_size: 15000,
            summary: true,
            key_points: true,
            topics: true,
            max_concurrent: 1,
            on_reduce_failure: ReduceFailure::Drop,
            language: "the same language as the transcription".to_string(),
        }
    }
}

impl AnalysisSettings {
    /// Check that the analysis can run at all with these values.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(RecapError::Config(
                "analysis.max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.sample_size == 0 {
            return Err(RecapError::Config(
                "analysis.sample_size must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(RecapError::Config(
                "analysis.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether any analysis kind is enabled.
    pub fn any_enabled(&self) -> bool {
        self.summary || self.key_points || self.topics
    }
}

/// Document source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// File name suffix selecting documents in a directory.
    pub suffix: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            suffix: "_formatted.txt".to_string(),
        }
    }
}

/// Result file format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One text file per analysis kind.
    #[default]
    Text,
    /// One JSON file per document.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

/// Result output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

/// Transcript formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingSettings {
    /// Longer transcripts are truncated before formatting.
    pub max_input_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            max_input_chars: 15000,
            temperature: 0.1,
            max_tokens: 2000,
        }
    }
}

/// Audio transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model name.
    pub model: String,
    /// ISO-639-1 language of the audio (auto-detect when unset).
    pub language: Option<String>,
    /// Base URL of an OpenAI-compatible audio API (api.openai.com when unset).
    pub api_base: Option<String>,
    /// Per-file timeout in seconds.
    pub timeout_seconds: u64,
    /// Re-transcribe files whose transcript already exists.
    pub overwrite: bool,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            api_base: None,
            timeout_seconds: 600,
            overwrite: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RecapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recap")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_budget() {
        let settings = Settings::default();
        assert_eq!(settings.analysis.max_chunk_size, 15000);
        assert_eq!(settings.analysis.sample_size, 15000);
        assert_eq!(settings.backend.timeout_seconds, 300);
        assert_eq!(settings.analysis.max_concurrent, 1);
        assert!(settings.analysis.any_enabled());
        assert!(settings.analysis.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [backend]
            model = "qwen2.5:7b"

            [analysis]
            topics = false
            on_reduce_failure = "concatenate"
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend.model, "qwen2.5:7b");
        assert_eq!(settings.backend.url, "http://localhost:11434");
        assert!(!settings.analysis.topics);
        assert!(settings.analysis.summary);
        assert_eq!(settings.analysis.on_reduce_failure, ReduceFailure::Concatenate);
        assert_eq!(settings.transcription.model, "whisper-1");
    }

    #[test]
    fn test_transcription_section() {
        let settings: Settings = toml::from_str(
            r#"
            [transcription]
            language = "es"
            overwrite = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.transcription.language.as_deref(), Some("es"));
        assert!(settings.transcription.overwrite);
        assert_eq!(settings.transcription.timeout_seconds, 600);
        assert!(settings.transcription.api_base.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut analysis = AnalysisSettings::default();
        analysis.max_chunk_size = 0;
        assert!(matches!(analysis.validate(), Err(RecapError::Config(_))));

        let mut analysis = AnalysisSettings::default();
        analysis.max_concurrent = 0;
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.backend.provider = BackendProvider::OpenAI;
        settings.output.format = OutputFormat::Json;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.backend.provider, BackendProvider::OpenAI);
        assert_eq!(loaded.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Ollama".parse::<BackendProvider>().unwrap(), BackendProvider::Ollama);
        assert_eq!("openai".parse::<BackendProvider>().unwrap(), BackendProvider::OpenAI);
        assert!("gemini".parse::<BackendProvider>().is_err());
    }
}
