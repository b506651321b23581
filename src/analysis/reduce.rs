//! Reduce stage: merge partial results into one.

use crate::config::ReduceFailure;
use crate::generation::Generator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator placed between partial results in the consolidation prompt.
pub const PARTIAL_SEPARATOR: &str = "\n\n";

/// Strategy for consolidating partial results.
///
/// Deduplication is best effort: the default [`LlmReducer`] asks the model
/// to merge and deduplicate. Other strategies can replace it without
/// changing how partials are produced.
#[async_trait]
pub trait Reducer: Send + Sync {
    /// Merge `partials` (in chunk order) into one result.
    ///
    /// `build_prompt` turns the combined partials into the consolidation
    /// prompt. Returns `None` when there is nothing to return.
    async fn reduce(
        &self,
        partials: Vec<String>,
        build_prompt: &(dyn for<'p> Fn(&'p str) -> String + Send + Sync),
    ) -> Option<String>;
}

/// Reducer that consolidates through one more generation call.
pub struct LlmReducer {
    generator: Arc<dyn Generator>,
    on_failure: ReduceFailure,
}

impl LlmReducer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            on_failure: ReduceFailure::Drop,
        }
    }

    /// Set what to return when the consolidation call fails.
    pub fn with_failure_policy(mut self, on_failure: ReduceFailure) -> Self {
        self.on_failure = on_failure;
        self
    }
}

#[async_trait]
impl Reducer for LlmReducer {
    async fn reduce(
        &self,
        partials: Vec<String>,
        build_prompt: &(dyn for<'p> Fn(&'p str) -> String + Send + Sync),
    ) -> Option<String> {
        match partials.len() {
            0 => None,
            // Returned as is, no generation call.
            1 => partials.into_iter().next(),
            count => {
                info!("Consolidating {} partial results", count);
                let combined = partials.join(PARTIAL_SEPARATOR);
                let prompt = build_prompt(&combined);

                match self.generator.generate(&prompt).await {
                    Ok(text) => Some(text),
                    Err(e) => match self.on_failure {
                        ReduceFailure::Drop => {
                            warn!("Consolidation failed, dropping result: {}", e);
                            None
                        }
                        ReduceFailure::Concatenate => {
                            warn!("Consolidation failed, keeping raw partials: {}", e);
                            debug!("Returning {} chars of joined partials", combined.len());
                            Some(combined)
                        }
                    },
                }
            }
        }
    }
}
