//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::config::TranscriptionSettings;
use crate::error::{RecapError, Result};
use crate::generation::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs,
    CreateTranscriptionResponseVerboseJson,
};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Largest upload the transcription endpoint accepts (25 MB).
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(model: &str, timeout: Duration, api_base: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout, api_base)?,
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        Self::new(
            &settings.model,
            Duration::from_secs(settings.timeout_seconds),
            settings.api_base.as_deref(),
        )
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display(), model = %self.model))]
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        let size = tokio::fs::metadata(audio_path).await?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(RecapError::Transcription(format!(
                "{} is {:.1} MB, the API accepts at most 25 MB",
                audio_path.display(),
                size as f64 / (1024.0 * 1024.0)
            )));
        }

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| RecapError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| RecapError::OpenAI(format!("Whisper API error: {}", e)))?;

        let source_id = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let transcript = to_transcript(source_id, response);

        debug!("Transcribed {} segments", transcript.segments.len());
        Ok(transcript)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Segments from the verbose response, or one segment spanning the whole
/// file when the service returned none.
fn to_transcript(source_id: &str, response: CreateTranscriptionResponseVerboseJson) -> Transcript {
    let segments = match response.segments {
        Some(segments) if !segments.is_empty() => segments
            .iter()
            .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
            .collect(),
        _ if response.text.trim().is_empty() => Vec::new(),
        _ => vec![TranscriptSegment::new(
            0.0,
            response.duration as f64,
            response.text.trim(),
        )],
    };

    let mut transcript = Transcript::from_segments(source_id, segments);
    if !response.text.trim().is_empty() {
        transcript.text = response.text.trim().to_string();
    }
    transcript.language = Some(response.language).filter(|l| !l.is_empty());
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn segment(id: i32, start: f32, end: f32, text: &str) -> serde_json::Value {
        json!({
            "id": id,
            "seek": 0,
            "start": start,
            "end": end,
            "text": text,
            "tokens": [],
            "temperature": 0.0,
            "avg_logprob": -0.2,
            "compression_ratio": 1.1,
            "no_speech_prob": 0.01
        })
    }

    #[tokio::test]
    async fn test_transcribes_through_api_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "language": "spanish",
                "duration": 4.0,
                "text": " Hola a todos. Bienvenidos. ",
                "segments": [
                    segment(0, 0.0, 1.5, " Hola a todos."),
                    segment(1, 1.5, 4.0, " Bienvenidos.")
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("welcome.mp3");
        std::fs::write(&audio, b"ID3 not really audio").unwrap();

        let settings = TranscriptionSettings {
            api_base: Some(format!("{}/v1", server.uri())),
            ..Default::default()
        };
        let transcriber = WhisperTranscriber::from_settings(&settings).unwrap();
        let transcript = transcriber.transcribe(&audio, Some("es")).await.unwrap();

        assert_eq!(transcript.source_id, "welcome");
        assert_eq!(transcript.text, "Hola a todos. Bienvenidos.");
        assert_eq!(transcript.language.as_deref(), Some("spanish"));
        assert_eq!(
            transcript.segments,
            vec![
                TranscriptSegment::new(0.0, 1.5, "Hola a todos."),
                TranscriptSegment::new(1.5, 4.0, "Bienvenidos."),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("long.wav");
        let file = std::fs::File::create(&audio).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let transcriber =
            WhisperTranscriber::new("whisper-1", Duration::from_secs(1), Some("http://127.0.0.1:9"))
                .unwrap();
        let err = transcriber.transcribe(&audio, None).await.unwrap_err();
        assert!(matches!(err, RecapError::Transcription(_)));
    }
}
