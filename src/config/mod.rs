//! Configuration module for Recap.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{FormattingPrompts, KeyPointPrompts, Prompts, SummaryPrompts, TopicPrompts};
pub use settings::{
    AnalysisSettings, BackendProvider, BackendSettings, FormattingSettings, GeneralSettings,
    OutputFormat, OutputSettings, PromptSettings, ReduceFailure, Settings, SourceSettings,
    TranscriptionSettings,
};
