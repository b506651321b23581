//! Transcribe command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::transcription::{list_audio, FileOutcome, TranscriptionRunner};
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(
    input: &str,
    output_dir: Option<&str>,
    model: Option<&str>,
    language: Option<&str>,
    force: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(dir) = output_dir {
        settings.general.output_dir = dir.to_string();
    }
    let transcription = &mut settings.transcription;
    if let Some(model) = model {
        transcription.model = model.to_string();
    }
    if let Some(language) = language {
        transcription.language = Some(language.to_string());
    }
    transcription.overwrite |= force;

    if transcription.api_base.is_none() {
        if let Err(e) = preflight::check_api_key() {
            Output::error(&format!("{}", e));
            Output::info("Run 'recap doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let inputs = list_audio(input).await?;
    if inputs.is_empty() {
        Output::warning(&format!("No audio files found in {}", input));
        return Ok(());
    }

    let out_dir = settings.output_dir();
    Output::info(&format!("Transcribing {} file(s)", inputs.len()));
    Output::kv("Model", &settings.transcription.model);
    Output::kv(
        "Language",
        settings.transcription.language.as_deref().unwrap_or("auto"),
    );
    Output::kv("Output", &out_dir.display().to_string());

    let runner = TranscriptionRunner::from_settings(settings.transcription)?;
    let pb = Output::progress_bar(inputs.len() as u64, "transcribing");

    let mut written = Vec::new();
    let mut skipped = 0;
    let mut failed = Vec::new();
    for path in &inputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name.clone());

        match runner.transcribe_file(path, &out_dir).await {
            Ok(FileOutcome::Written(path)) => written.push(path),
            Ok(FileOutcome::Skipped(_)) => {
                pb.println(format!("  skipped {} (already transcribed)", name));
                skipped += 1;
            }
            Err(e) => failed.push(format!("{}: {}", name, e)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for path in &written {
        Output::kv("Wrote", &path.display().to_string());
    }
    for failure in &failed {
        Output::error(failure);
    }

    let summary = format!(
        "Transcribed {} file(s), skipped {}, failed {}",
        written.len(),
        skipped,
        failed.len()
    );
    if failed.is_empty() {
        Output::success(&summary);
        if !written.is_empty() {
            Output::info(&format!("Next: recap format {}", out_dir.display()));
        }
    } else {
        Output::warning(&summary);
    }

    Ok(())
}
