//! Writes analysis results to the local filesystem.

use super::ResultSink;
use crate::analysis::{AnalysisBundle, AnalysisKind};
use crate::config::OutputFormat;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Width of the banner around text headings.
const RULE_WIDTH: usize = 80;

/// JSON document written in [`OutputFormat::Json`] mode.
#[derive(Debug, Serialize)]
pub struct AnalysisExport<'a> {
    pub document_id: &'a str,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub analysis: &'a AnalysisBundle,
}

/// Sink writing one text file per analysis kind, or one JSON file per document.
pub struct FileSink {
    output_dir: PathBuf,
    format: OutputFormat,
    model: Option<String>,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            model: None,
        }
    }

    /// Record the model name in JSON output.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the text file for one kind.
    pub fn text_path(&self, document_id: &str, kind: AnalysisKind) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.txt", document_id, kind.key()))
    }

    /// Path of the JSON file for a document.
    pub fn json_path(&self, document_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}_analysis.json", document_id))
    }

    /// Text file body: a ruled heading followed by the result.
    pub fn render_text(kind: AnalysisKind, text: &str) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!("{rule}\n{}\n{rule}\n\n{}\n", kind.title(), text.trim_end())
    }

    async fn write_file(path: &Path, content: &str) -> Result<()> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| RecapError::Sink(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn write(&self, document_id: &str, bundle: &AnalysisBundle) -> Result<Vec<String>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut written = Vec::new();
        match self.format {
            OutputFormat::Text => {
                for (kind, text) in bundle.iter() {
                    let path = self.text_path(document_id, kind);
                    Self::write_file(&path, &Self::render_text(kind, text)).await?;
                    info!("Saved {} to {}", kind, path.display());
                    written.push(path.display().to_string());
                }
            }
            OutputFormat::Json => {
                let export = AnalysisExport {
                    document_id,
                    generated_at: Utc::now(),
                    model: self.model.as_deref(),
                    analysis: bundle,
                };
                let path = self.json_path(document_id);
                Self::write_file(&path, &serde_json::to_string_pretty(&export)?).await?;
                info!("Saved analysis to {}", path.display());
                written.push(path.display().to_string());
            }
        }

        Ok(written)
    }
}
