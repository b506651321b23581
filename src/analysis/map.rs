//! Map stage: one generation call per chunk.

use crate::generation::{preview, Generator};
use futures::stream::{self, StreamExt};
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// How chunk calls are dispatched to the backend.
///
/// Local inference servers usually have a single generation slot, so the
/// default keeps one call in flight. Backends with real parallel capacity
/// can use [`Scheduler::Concurrent`]; results keep chunk order either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduler {
    #[default]
    Sequential,
    Concurrent {
        max_in_flight: usize,
    },
}

impl Scheduler {
    /// Scheduler allowing up to `max_concurrent` calls (1 = sequential).
    pub fn from_max_concurrent(max_concurrent: usize) -> Self {
        if max_concurrent <= 1 {
            Scheduler::Sequential
        } else {
            Scheduler::Concurrent {
                max_in_flight: max_concurrent,
            }
        }
    }

    fn max_in_flight(&self) -> usize {
        match self {
            Scheduler::Sequential => 1,
            Scheduler::Concurrent { max_in_flight } => (*max_in_flight).max(1),
        }
    }
}

/// Run one generation call per chunk and collect the successful outputs.
///
/// Failed chunks are logged and skipped, never retried. The result is in
/// chunk order and may be empty when every call failed.
pub async fn map_chunks<F>(
    generator: &dyn Generator,
    chunks: &[Cow<'_, str>],
    build_prompt: F,
    scheduler: Scheduler,
) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let total = chunks.len();
    debug!("Mapping {} chunks ({:?})", total, scheduler);

    let outcomes: Vec<_> = stream::iter(chunks.iter().enumerate())
        .map(|(index, chunk)| {
            let prompt = build_prompt(&**chunk);
            async move {
                if total > 1 {
                    info!("Processing chunk {}/{}", index + 1, total);
                }
                (index, generator.generate(&prompt).await)
            }
        })
        .buffered(scheduler.max_in_flight())
        .collect()
        .await;

    let mut partials = Vec::with_capacity(total);
    for (index, outcome) in outcomes {
        match outcome {
            Ok(text) => {
                debug!("Chunk {} -> {}", index + 1, preview(&text, 80));
                partials.push(text);
            }
            Err(e) => warn!("Skipping chunk {}/{}: {}", index + 1, total, e),
        }
    }

    if partials.is_empty() && total > 0 {
        warn!("No chunk produced a result");
    }

    partials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RecapError, Result};
    use crate::generation::testing::ScriptedGenerator;
    use crate::generation::GenerationOptions;
    use async_trait::async_trait;
    use std::time::Duration;

    fn chunks(texts: &[&'static str]) -> Vec<Cow<'static, str>> {
        texts.iter().map(|t| Cow::Borrowed(*t)).collect()
    }

    #[tokio::test]
    async fn test_every_chunk_gets_a_prompt() {
        let generator = ScriptedGenerator::numbered();
        let partials = map_chunks(
            &generator,
            &chunks(&["alpha", "beta", "gamma"]),
            |c| format!("Summarize: {}", c),
            Scheduler::Sequential,
        )
        .await;

        assert_eq!(partials, vec!["response 0", "response 1", "response 2"]);
        assert_eq!(
            generator.prompts(),
            vec!["Summarize: alpha", "Summarize: beta", "Summarize: gamma"]
        );
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let generator = ScriptedGenerator::new(|i, _| {
            if i == 1 {
                Err(RecapError::Generation("timed out".to_string()))
            } else {
                Ok(format!("part {}", i))
            }
        });

        let partials = map_chunks(
            &generator,
            &chunks(&["a", "b", "c"]),
            |c| c.to_string(),
            Scheduler::Sequential,
        )
        .await;

        assert_eq!(partials, vec!["part 0", "part 2"]);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_failed_is_empty_not_error() {
        let generator = ScriptedGenerator::failing();
        let partials = map_chunks(
            &generator,
            &chunks(&["a", "b"]),
            |c| c.to_string(),
            Scheduler::Sequential,
        )
        .await;

        assert!(partials.is_empty());
        assert_eq!(generator.calls(), 2);
    }

    /// Answers later chunks faster than earlier ones.
    struct SlowFirstGenerator;

    #[async_trait]
    impl Generator for SlowFirstGenerator {
        async fn generate_with_options(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String> {
            let index: u64 = prompt.parse().unwrap();
            tokio::time::sleep(Duration::from_millis(60 - index * 20)).await;
            Ok(format!("done {}", index))
        }

        fn model(&self) -> &str {
            "slow-first"
        }
    }

    #[tokio::test]
    async fn test_concurrent_keeps_chunk_order() {
        let partials = map_chunks(
            &SlowFirstGenerator,
            &chunks(&["0", "1", "2"]),
            |c| c.to_string(),
            Scheduler::Concurrent { max_in_flight: 3 },
        )
        .await;

        assert_eq!(partials, vec!["done 0", "done 1", "done 2"]);
    }

    #[test]
    fn test_scheduler_from_max_concurrent() {
        assert_eq!(Scheduler::from_max_concurrent(1), Scheduler::Sequential);
        assert_eq!(
            Scheduler::from_max_concurrent(4),
            Scheduler::Concurrent { max_in_flight: 4 }
        );
    }
}
