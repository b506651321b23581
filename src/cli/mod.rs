//! CLI module for Recap.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::{BackendProvider, OutputFormat, Settings};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

/// Recap - Transcription analysis with LLMs
///
/// A local-first CLI tool that turns transcriptions into executive summaries,
/// key points and topic lists using a local Ollama model or OpenAI.
#[derive(Parser, Debug)]
#[command(name = "recap")]
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
    /// Check backend availability and configuration
    Doctor,

    /// Analyze transcriptions (summary, key points, topics)
    Analyze {
        /// Transcription file, or directory of transcriptions
        input: String,

        #[command(flatten)]
        backend: BackendArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Directory for analysis results
        #[arg(short, long, env = "RECAP_OUTPUT_DIR")]
        output_dir: Option<String>,

        /// Result format (text, json)
        #[arg(long)]
        format: Option<String>,

        /// Skip backend checks before starting
        #[arg(long)]
        skip_preflight: bool,
    },

    /// Transcribe audio files into raw transcriptions with Whisper
    Transcribe {
        /// Audio file, or directory of audio files
        input: String,

        /// Directory for transcriptions
        #[arg(short, long, env = "RECAP_OUTPUT_DIR")]
        output_dir: Option<String>,

        /// Whisper model
        #[arg(short, long, env = "WHISPER_MODEL")]
        model: Option<String>,

        /// Audio language as an ISO-639-1 code (e.g. es, en)
        #[arg(short, long, env = "AUDIO_LANGUAGE")]
        language: Option<String>,

        /// Re-transcribe files that already have a transcription
        #[arg(long)]
        force: bool,
    },

    /// Format raw transcriptions into readable paragraphs
    Format {
        /// Raw transcription file, or directory of .txt files
        input: String,

        #[command(flatten)]
        backend: BackendArgs,

        /// Directory for formatted transcriptions
        #[arg(short, long, env = "RECAP_OUTPUT_DIR")]
        output_dir: Option<String>,

        /// Skip backend checks before starting
        #[arg(long)]
        skip_preflight: bool,
    },

    /// Download the configured Ollama model
    Pull {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Backend overrides shared by commands that generate text.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Generation backend (ollama, openai)
    #[arg(long)]
    pub provider: Option<String>,

    /// Ollama server URL
    #[arg(long, env = "OLLAMA_HOST")]
    pub host: Option<String>,

    /// Model to generate with
    #[arg(short, long, env = "OLLAMA_MODEL")]
    pub model: Option<String>,
}

impl BackendArgs {
    /// Apply the overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(provider) = &self.provider {
            settings.backend.provider = provider
                .parse::<BackendProvider>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Some(host) = &self.host {
            settings.backend.url = host.clone();
        }
        if let Some(model) = &self.model {
            settings.backend.model = model.clone();
        }
        Ok(())
    }
}

/// Analysis overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Generate the executive summary (true/false)
    #[arg(long, env = "ENABLE_SUMMARY", value_parser = BoolishValueParser::new())]
    pub summary: Option<bool>,

    /// Extract key points (true/false)
    #[arg(long, env = "ENABLE_KEY_POINTS", value_parser = BoolishValueParser::new())]
    pub key_points: Option<bool>,

    /// Identify main topics (true/false)
    #[arg(long, env = "ENABLE_TOPICS", value_parser = BoolishValueParser::new())]
    pub topics: Option<bool>,

    /// Maximum concurrent generation calls per document
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Language to write results in
    #[arg(long)]
    pub language: Option<String>,
}

impl AnalysisArgs {
    /// Apply the overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        let analysis = &mut settings.analysis;
        if let Some(summary) = self.summary {
            analysis.summary = summary;
        }
        if let Some(key_points) = self.key_points {
            analysis.key_points = key_points;
        }
        if let Some(topics) = self.topics {
            analysis.topics = topics;
        }
        if let Some(concurrency) = self.concurrency {
            analysis.max_concurrent = concurrency;
        }
        if let Some(language) = &self.language {
            analysis.language = language.clone();
        }
    }
}

/// Apply `--output-dir` and `--format` overrides.
pub fn apply_output_overrides(
    settings: &mut Settings,
    output_dir: Option<&str>,
    format: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(dir) = output_dir {
        settings.general.output_dir = dir.to_string();
    }
    if let Some(format) = format {
        settings.output.format = format
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
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
