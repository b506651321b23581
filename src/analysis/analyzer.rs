//! Runs the three analyses over a document.

use super::{map_chunks, AnalysisBundle, AnalysisKind, LlmReducer, Reducer, Scheduler};
use crate::chunking::{chunk_text, sample_head_tail};
use crate::config::{AnalysisSettings, Prompts};
use crate::error::Result;
use crate::generation::Generator;
use crate::source::Document;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Produces summaries, key points and topics for transcriptions.
pub struct Analyzer {
    generator: Arc<dyn Generator>,
    reducer: Arc<dyn Reducer>,
    prompts: Prompts,
    settings: AnalysisSettings,
    scheduler: Scheduler,
}

impl Analyzer {
    /// Create an analyzer. Fails when the settings cannot work (zero chunk size, ...).
    pub fn new(
        generator: Arc<dyn Generator>,
        prompts: Prompts,
        settings: AnalysisSettings,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = if prompts.variables.contains_key("language") {
            prompts
        } else {
            prompts.with_variable("language", &settings.language)
        };

        let reducer = Arc::new(
            LlmReducer::new(generator.clone()).with_failure_policy(settings.on_reduce_failure),
        );

        Ok(Self {
            generator,
            reducer,
            prompts,
            scheduler: Scheduler::from_max_concurrent(settings.max_concurrent),
            settings,
        })
    }

    /// Replace the consolidation strategy.
    pub fn with_reducer(mut self, reducer: Arc<dyn Reducer>) -> Self {
        self.reducer = reducer;
        self
    }

    /// Replace the chunk scheduler.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Run every enabled analysis on `document`.
    ///
    /// Each analysis is independent: one failing never stops the others.
    /// The bundle holds only the analyses that produced a result and is
    /// empty for blank documents, which make no generation calls.
    #[instrument(skip(self, document), fields(document = %document.id, chars = document.char_count()))]
    pub async fn analyze(&self, document: &Document) -> AnalysisBundle {
        let mut bundle = AnalysisBundle::new();

        if document.is_blank() {
            warn!("Document {} is empty, nothing to analyze", document.id);
            return bundle;
        }

        info!("Starting analysis of {}", document.id);
        let text = document.content.as_str();

        if self.settings.summary {
            if let Some(summary) = self.summarize(text).await {
                bundle.insert(AnalysisKind::Summary, summary);
                info!("Summary generated");
            } else {
                warn!("No summary could be generated");
            }
        }

        if self.settings.key_points {
            if let Some(points) = self.extract_key_points(text).await {
                bundle.insert(AnalysisKind::KeyPoints, points);
                info!("Key points extracted");
            } else {
                warn!("No key points could be extracted");
            }
        }

        if self.settings.topics {
            if let Some(topics) = self.identify_topics(text).await {
                bundle.insert(AnalysisKind::Topics, topics);
                info!("Topics identified");
            } else {
                warn!("No topics could be identified");
            }
        }

        bundle
    }

    /// Executive summary of `text`.
    pub async fn summarize(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        info!("Generating executive summary...");

        let chunks: Vec<Cow<'_, str>> = chunk_text(text, self.settings.max_chunk_size).collect();
        // A text that fits gets the full summary prompt straight away.
        let template = if chunks.len() == 1 {
            &self.prompts.summary.single
        } else {
            &self.prompts.summary.partial
        };

        let partials = map_chunks(
            self.generator.as_ref(),
            &chunks,
            |chunk| self.prompts.render_one(template, "text", chunk),
            self.scheduler,
        )
        .await;

        let reduce_template = &self.prompts.summary.reduce;
        self.reducer
            .reduce(partials, &|combined: &str| {
                self.prompts.render_one(reduce_template, "partials", combined)
            })
            .await
    }

    /// Consolidated bullet list of key points in `text`.
    pub async fn extract_key_points(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        info!("Extracting key points...");

        let chunks: Vec<Cow<'_, str>> = chunk_text(text, self.settings.max_chunk_size).collect();
        let template = &self.prompts.key_points.extract;

        let partials = map_chunks(
            self.generator.as_ref(),
            &chunks,
            |chunk| self.prompts.render_one(template, "text", chunk),
            self.scheduler,
        )
        .await;

        let consolidate_template = &self.prompts.key_points.consolidate;
        self.reducer
            .reduce(partials, &|combined: &str| {
                self.prompts
                    .render_one(consolidate_template, "partials", combined)
            })
            .await
    }

    /// Main topics of `text`, from a head+tail sample.
    pub async fn identify_topics(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        info!("Identifying main topics...");

        let sample = sample_head_tail(text, self.settings.sample_size);
        let prompt = self
            .prompts
            .render_one(&self.prompts.topics.extract, "text", &sample);

        match self.generator.generate(&prompt).await {
            Ok(topics) => Some(topics),
            Err(e) => {
                warn!("Topic identification failed: {}", e);
                None
            }
        }
    }
}
