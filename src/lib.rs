//! Recap - Transcription analysis with LLMs
//!
//! A local-first CLI tool that turns long transcriptions into an executive
//! summary, a list of key points and the main topics, using a local Ollama
//! model or the OpenAI API.
//!
//! # Overview
//!
//! Recap allows you to:
//! - Transcribe audio recordings with Whisper
//! - Analyze one transcription or a whole directory of them
//! - Format raw speech-to-text output into readable paragraphs
//! - Run everything against a local model, pulled on first use
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `generation` - Text generation backends (Ollama, OpenAI)
//! - `chunking` - Word-boundary chunking and head+tail sampling
//! - `analysis` - Map-reduce analysis of a document
//! - `source` - Document sources
//! - `sink` - Result sinks
//! - `formatter` - Transcript formatting
//! - `transcription` - Audio to raw transcripts
//! - `orchestrator` - Batch pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use recap::config::Settings;
//! use recap::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Analyze every *_formatted.txt file in a directory
//!     let report = orchestrator.run("./transcriptions").await?;
//!     println!("Analyzed {} documents", report.analyzed.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod generation;
pub mod orchestrator;
pub mod sink;
pub mod source;
pub mod transcription;

pub use error::{RecapError, Result};
