//! Pipeline orchestrator for Recap.
//!
//! Coordinates a batch run: list documents, analyze each one, write results.

use crate::analysis::Analyzer;
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::formatter::Formatter;
use crate::generation::{create_generator, Generator};
use crate::sink::{FileSink, ResultSink};
use crate::source::{DocumentSource, LocalSource};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The main orchestrator for the Recap pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    generator: Arc<dyn Generator>,
    analyzer: Analyzer,
    source: Arc<dyn DocumentSource>,
    sink: Arc<dyn ResultSink>,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator = create_generator(&settings.backend)?;
        info!(
            "Using {} backend with model {}",
            settings.backend.provider,
            generator.model()
        );

        let source = Arc::new(LocalSource::new(&settings.source.suffix));
        let sink = Arc::new(
            FileSink::new(settings.output_dir(), settings.output.format)
                .with_model(generator.model()),
        );

        Self::with_components(settings, prompts, generator, source, sink)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        generator: Arc<dyn Generator>,
        source: Arc<dyn DocumentSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        let analyzer = Analyzer::new(generator.clone(), prompts.clone(), settings.analysis.clone())?;

        Ok(Self {
            settings,
            prompts,
            generator,
            analyzer,
            source,
            sink,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the generator.
    pub fn generator(&self) -> Arc<dyn Generator> {
        self.generator.clone()
    }

    /// Get the analyzer.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Build a transcript formatter sharing this orchestrator's backend.
    pub fn formatter(&self) -> Formatter {
        Formatter::new(
            self.generator.clone(),
            self.prompts.clone(),
            self.settings.formatting.clone(),
        )
    }

    /// Analyze every document for `input` and write the results.
    ///
    /// Only listing the input can fail the run. A document that cannot be
    /// read or written is counted in the report and the batch moves on.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn run(&self, input: &str) -> Result<RunReport> {
        let documents = self.source.list(input).await?;
        let total = documents.len();
        info!("Found {} document(s) to analyze", total);

        let mut report = RunReport::default();

        for (idx, document_ref) in documents.iter().enumerate() {
            info!("Processing document {}/{}: {}", idx + 1, total, document_ref.id);

            let document = match self.source.read(document_ref).await {
                Ok(document) => document,
                Err(e) => {
                    error!("Failed to read {}: {}", document_ref.location, e);
                    report.failed.push(document_ref.id.clone());
                    continue;
                }
            };

            let bundle = self.analyzer.analyze(&document).await;
            if bundle.is_empty() {
                warn!("No analysis produced for {}", document.id);
                report.empty.push(document.id);
                continue;
            }

            match self.sink.write(&document.id, &bundle).await {
                Ok(locations) => {
                    report.written.extend(locations);
                    report.analyzed.push(document.id);
                }
                Err(e) => {
                    error!("Failed to write results for {}: {}", document.id, e);
                    report.failed.push(document.id);
                }
            }
        }

        info!(
            "Analyzed {}/{} document(s) ({} empty, {} failed)",
            report.analyzed.len(),
            total,
            report.empty.len(),
            report.failed.len()
        );

        Ok(report)
    }
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Documents with at least one analysis written.
    pub analyzed: Vec<String>,
    /// Documents that produced no analysis (blank, or every call failed).
    pub empty: Vec<String>,
    /// Documents that could not be read or whose results could not be written.
    pub failed: Vec<String>,
    /// Locations written by the sink.
    pub written: Vec<String>,
}

impl RunReport {
    /// Number of documents seen.
    pub fn total(&self) -> usize {
        self.analyzed.len() + self.empty.len() + self.failed.len()
    }

    /// Whether every document produced results.
    pub fn is_complete(&self) -> bool {
        self.empty.is_empty() && self.failed.is_empty()
    }
}
