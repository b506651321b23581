//! Audio transcription.
//!
//! Turns recordings into the raw `{stem}.txt` transcripts that `recap format`
//! picks up. Each file also gets a `{stem}_segments.txt` companion with the
//! timestamped segments, which the formatter ignores.

mod whisper;

pub use whisper::{WhisperTranscriber, MAX_UPLOAD_BYTES};

use crate::config::TranscriptionSettings;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Supported audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "aac", "ogg", "wma", "opus"];

/// Suffix of the timestamped companion file.
pub const SEGMENTS_SUFFIX: &str = "_segments.txt";

/// A timed piece of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// Transcript of one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// File stem of the recording.
    pub source_id: String,
    /// Full text as returned by the service.
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    /// Language reported by the service, if any.
    pub language: Option<String>,
}

impl Transcript {
    /// Build a transcript whose text is the segments joined by spaces.
    pub fn from_segments(source_id: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            source_id: source_id.into(),
            text,
            segments,
            language: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait for speech-to-text services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the file at `audio_path`. `language` is an ISO-639-1 hint.
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript>;

    /// Model identifier, recorded in the segments file.
    fn model(&self) -> &str;
}

/// Whether `path` has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio files for `input`: the file itself, or every audio file in the
/// directory, sorted by name.
pub async fn list_audio(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);

    if !path.exists() {
        return Err(RecapError::Source(format!("Path not found: {}", input)));
    }

    if path.is_file() {
        if !is_audio_file(path) {
            return Err(RecapError::InvalidInput(format!(
                "Unsupported audio format: {} (expected one of: {})",
                input,
                AUDIO_EXTENSIONS.join(", ")
            )));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut entries = tokio::fs::read_dir(path).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        if entry_path.is_file() && is_audio_file(&entry_path) {
            paths.push(entry_path);
        }
    }
    paths.sort();

    debug!("Found {} audio files in {}", paths.len(), input);
    Ok(paths)
}

/// What happened to one audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The transcript was written to this path.
    Written(PathBuf),
    /// A transcript already existed at this path.
    Skipped(PathBuf),
}

/// Transcribes audio files into `{stem}.txt`.
pub struct TranscriptionRunner {
    transcriber: Arc<dyn Transcriber>,
    settings: TranscriptionSettings,
}

impl TranscriptionRunner {
    pub fn new(transcriber: Arc<dyn Transcriber>, settings: TranscriptionSettings) -> Self {
        Self {
            transcriber,
            settings,
        }
    }

    /// Runner backed by the Whisper API.
    pub fn from_settings(settings: TranscriptionSettings) -> Result<Self> {
        let transcriber = Arc::new(WhisperTranscriber::from_settings(&settings)?);
        Ok(Self::new(transcriber, settings))
    }

    /// Where the transcript of `audio` goes.
    pub fn transcript_path(audio: &Path, out_dir: &Path) -> Result<PathBuf> {
        Ok(out_dir.join(format!("{}.txt", stem(audio)?)))
    }

    /// Transcribe `audio` into `out_dir`, unless its transcript exists and
    /// overwriting is off.
    #[instrument(skip(self, out_dir), fields(path = %audio.display()))]
    pub async fn transcribe_file(&self, audio: &Path, out_dir: &Path) -> Result<FileOutcome> {
        let output_path = Self::transcript_path(audio, out_dir)?;
        if output_path.exists() && !self.settings.overwrite {
            info!("Transcript already exists: {}", output_path.display());
            return Ok(FileOutcome::Skipped(output_path));
        }

        let language = self.settings.language.as_deref();
        let transcript = self.transcriber.transcribe(audio, language).await?;
        if transcript.is_blank() {
            warn!("No speech found in {}", audio.display());
        }

        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(&output_path, &transcript.text)
            .await
            .map_err(|e| {
                RecapError::Sink(format!("Failed to write {}: {}", output_path.display(), e))
            })?;

        let segments_path = out_dir.join(format!("{}{}", stem(audio)?, SEGMENTS_SUFFIX));
        tokio::fs::write(&segments_path, self.render_segments(audio, &transcript))
            .await
            .map_err(|e| {
                RecapError::Sink(format!("Failed to write {}: {}", segments_path.display(), e))
            })?;

        info!(
            "Saved transcript ({} segments) to {}",
            transcript.segments.len(),
            output_path.display()
        );
        Ok(FileOutcome::Written(output_path))
    }

    fn render_segments(&self, audio: &Path, transcript: &Transcript) -> String {
        let name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let language = transcript
            .language
            .as_deref()
            .or(self.settings.language.as_deref())
            .unwrap_or("auto");

        let mut out = format!(
            "Transcription of: {}\nTranscribed on: {}\nModel: {}\nLanguage: {}\n{}\n\n{}\n\nSEGMENTS\n\n",
            name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.transcriber.model(),
            language,
            "=".repeat(80),
            transcript.text
        );
        for segment in &transcript.segments {
            out.push_str(&format!(
                "[{:.2}s -> {:.2}s] {}\n",
                segment.start_seconds,
                segment.end_seconds,
                segment.text.trim()
            ));
        }
        out
    }
}

fn stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RecapError::InvalidInput(format!("Invalid file name: {}", path.display())))
}
