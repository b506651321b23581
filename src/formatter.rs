//! Transcript formatting.
//!
//! Raw speech-to-text output is one long run of words. The formatter asks the
//! model to split it into paragraphs and punctuate it without summarizing, and
//! writes the result as `{stem}_formatted.txt`, the input the analyzer picks up
//! by default.

use crate::config::{FormattingSettings, Prompts};
use crate::error::{RecapError, Result};
use crate::generation::{GenerationOptions, Generator};
use crate::source::{DocumentSource, LocalSource};
use crate::transcription::SEGMENTS_SUFFIX;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Suffix of formatted transcripts.
pub const FORMATTED_SUFFIX: &str = "_formatted.txt";

/// Formats raw transcripts through a generation backend.
pub struct Formatter {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    settings: FormattingSettings,
}

impl Formatter {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, settings: FormattingSettings) -> Self {
        Self {
            generator,
            prompts,
            settings,
        }
    }

    /// Format one transcript.
    ///
    /// Blank input is returned unchanged without a call. If generation fails
    /// the raw text is returned, so callers always get something to write.
    pub async fn format_text(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            warn!("Empty text, skipping formatting");
            return raw.to_string();
        }

        let text = truncate(raw, self.settings.max_input_chars);
        if text.len() != raw.len() {
            warn!(
                "Text too long ({} chars), formatting only the first {}",
                raw.chars().count(),
                self.settings.max_input_chars
            );
        }

        let prompt = self
            .prompts
            .render_one(&self.prompts.formatting.user, "text", &text);
        let options = GenerationOptions {
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        };

        match self.generator.generate_with_options(&prompt, &options).await {
            Ok(formatted) => {
                info!("Formatted text ({} chars)", formatted.len());
                formatted
            }
            Err(e) => {
                warn!("Formatting failed, keeping raw text: {}", e);
                raw.to_string()
            }
        }
    }

    /// Format the transcript at `path` into `out_dir`.
    ///
    /// Returns the written path, or `None` when the file is blank.
    #[instrument(skip(self, out_dir), fields(path = %path.display()))]
    pub async fn format_file(&self, path: &Path, out_dir: &Path) -> Result<Option<PathBuf>> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RecapError::Source(format!("Failed to read {}: {}", path.display(), e)))?;

        if raw.trim().is_empty() {
            warn!("File is empty: {}", path.display());
            return Ok(None);
        }

        let formatted = self.format_text(&raw).await;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RecapError::InvalidInput(format!("Invalid file name: {}", path.display())))?;
        let output_path = out_dir.join(format!("{}{}", stem, FORMATTED_SUFFIX));

        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(&output_path, self.render(path, &formatted))
            .await
            .map_err(|e| {
                RecapError::Sink(format!("Failed to write {}: {}", output_path.display(), e))
            })?;

        info!("Saved formatted text to {}", output_path.display());
        Ok(Some(output_path))
    }

    /// Raw transcripts to format for `input`: the file itself, or every
    /// `.txt` file in the directory that is not already a formatter or
    /// analyzer output, nor a timestamped segments file.
    pub async fn list_inputs(&self, input: &str) -> Result<Vec<PathBuf>> {
        let source = LocalSource::new(".txt");
        let refs = source.list(input).await?;

        if Path::new(input).is_file() {
            return Ok(refs.into_iter().map(|r| PathBuf::from(r.location)).collect());
        }

        Ok(refs
            .into_iter()
            .filter(|r| {
                !r.location.ends_with(FORMATTED_SUFFIX) && !r.location.ends_with(SEGMENTS_SUFFIX)
            })
            .map(|r| PathBuf::from(r.location))
            .collect())
    }

    fn render(&self, source: &Path, formatted: &str) -> String {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        format!(
            "Formatted transcription of: {}\nFormatted on: {}\nModel: {}\n{}\n\n{}",
            name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.generator.model(),
            "=".repeat(80),
            formatted
        )
    }
}

/// First `max_chars` characters of `text` followed by `...`, or `text` if it fits.
fn truncate(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]).into(),
        None => text.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::ScriptedGenerator;

    fn formatter(generator: Arc<ScriptedGenerator>) -> Formatter {
        Formatter::new(generator, Prompts::default(), FormattingSettings::default())
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hola", 10), "hola");
        assert_eq!(truncate("canción", 4), "canc...");
    }

    #[tokio::test]
    async fn test_format_text_uses_low_temperature() {
        let generator = Arc::new(ScriptedGenerator::new(|_, _| Ok("Hello. World.".to_string())));
        let formatter = formatter(generator.clone());

        let formatted = formatter.format_text("hello world").await;
        assert_eq!(formatted, "Hello. World.");

        let options = generator.options();
        assert_eq!(options[0].temperature, Some(0.1));
        assert_eq!(options[0].max_tokens, Some(2000));
        assert!(generator.prompts()[0].contains("TRANSCRIPTION:\nhello world"));
    }

    #[tokio::test]
    async fn test_format_text_falls_back_to_raw() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let formatter = formatter(generator);

        assert_eq!(formatter.format_text("raw words here").await, "raw words here");
    }

    #[tokio::test]
    async fn test_blank_text_is_not_sent() {
        let generator = Arc::new(ScriptedGenerator::numbered());
        let formatter = formatter(generator.clone());

        assert_eq!(formatter.format_text("  \n").await, "  \n");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_long_text_is_truncated() {
        let generator = Arc::new(ScriptedGenerator::numbered());
        let settings = FormattingSettings {
            max_input_chars: 5,
            ..Default::default()
        };
        let formatter = Formatter::new(generator.clone(), Prompts::default(), settings);

        formatter.format_text("abcdefghij").await;
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("abcde..."));
        assert!(!prompt.contains("abcdef"));
    }

    #[tokio::test]
    async fn test_format_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("meeting.txt");
        std::fs::write(&input, "so today we talk about rivers").unwrap();

        let generator = Arc::new(ScriptedGenerator::new(|_, _| {
            Ok("So, today we talk about rivers.".to_string())
        }));
        let formatter = formatter(generator);

        let out = dir.path().join("out");
        let written = formatter.format_file(&input, &out).await.unwrap().unwrap();
        assert_eq!(written, out.join("meeting_formatted.txt"));

        let content = std::fs::read_to_string(&written).unwrap();
        assert!(content.starts_with("Formatted transcription of: meeting.txt\n"));
        assert!(content.contains("Model: scripted\n"));
        assert!(content.contains(&"=".repeat(80)));
        assert!(content.ends_with("So, today we talk about rivers."));
    }

    #[tokio::test]
    async fn test_blank_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("silence.txt");
        std::fs::write(&input, "\n\n").unwrap();

        let generator = Arc::new(ScriptedGenerator::numbered());
        let formatter = formatter(generator.clone());

        assert!(formatter.format_file(&input, dir.path()).await.unwrap().is_none());
        assert_eq!(generator.calls(), 0);
        assert!(!dir.path().join("silence_formatted.txt").exists());
    }

    #[tokio::test]
    async fn test_list_inputs_skips_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "a.txt",
            "b.txt",
            "a_formatted.txt",
            "a_summary.txt",
            "a_segments.txt",
            "notes.md",
        ] {
            std::fs::write(dir.path().join(name), "text").unwrap();
        }

        let formatter = formatter(Arc::new(ScriptedGenerator::numbered()));
        let inputs = formatter
            .list_inputs(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
