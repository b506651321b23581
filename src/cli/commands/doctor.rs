//! Doctor command - verify backend availability and configuration.

use crate::cli::Output;
use crate::config::{BackendProvider, Settings, TranscriptionSettings};
use crate::generation::OllamaGenerator;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Recap Doctor");
    println!();
    println!("Checking backend and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Generation Backend").bold());
    let backend_checks = match settings.backend.provider {
        BackendProvider::Ollama => check_ollama(settings).await,
        BackendProvider::OpenAI => vec![check_openai_api_key()],
    };
    for check in &backend_checks {
        check.print();
    }
    checks.extend(backend_checks);

    println!();

    println!("{}", style("Transcription").bold());
    let transcription_check = check_transcription(
        &settings.transcription,
        std::env::var("OPENAI_API_KEY").ok().as_deref(),
    );
    transcription_check.print();
    checks.push(transcription_check);

    println!();

    println!("{}", style("Analysis").bold());
    let analysis_checks = check_analysis(settings);
    for check in &analysis_checks {
        check.print();
    }
    checks.extend(analysis_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_output_dir(&settings.output_dir());
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);
    if let Some(dir) = &settings.prompts.custom_dir {
        let prompts_check = check_prompts_dir(&Settings::expand_path(dir));
        prompts_check.print();
        checks.push(prompts_check);
    }

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Recap.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Recap is ready to use.");
    }

    Ok(())
}

/// Check the Ollama server and the configured model.
async fn check_ollama(settings: &Settings) -> Vec<CheckResult> {
    let backend = &settings.backend;
    let ollama = match OllamaGenerator::from_settings(backend) {
        Ok(ollama) => ollama,
        Err(e) => {
            return vec![CheckResult::error(
                "Ollama",
                &format!("invalid configuration: {}", e),
                "Check backend.url in the config file",
            )]
        }
    };

    if !ollama.is_available().await {
        return vec![CheckResult::error(
            "Ollama",
            &format!("not reachable at {}", backend.url),
            "Start it with: ollama serve (or set OLLAMA_HOST)",
        )];
    }

    let mut results = vec![CheckResult::ok("Ollama", &backend.url)];
    let pull_hint = format!("Download it with: recap pull --model {}", backend.model);
    results.push(match ollama.has_model().await {
        Ok(true) => CheckResult::ok("Model", &format!("{} installed", backend.model)),
        Ok(false) => CheckResult::warning(
            "Model",
            &format!("{} not installed (pulled on first use)", backend.model),
            &pull_hint,
        ),
        Err(e) => CheckResult::error("Model", &format!("could not list models: {}", e), &pull_hint),
    });
    results
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check that `recap transcribe` can reach its API. Only a warning, since
/// transcription is optional.
fn check_transcription(settings: &TranscriptionSettings, api_key: Option<&str>) -> CheckResult {
    if let Some(base) = &settings.api_base {
        return CheckResult::ok("Whisper", &format!("{} via {}", settings.model, base));
    }
    match api_key {
        Some(key) if !key.is_empty() => CheckResult::ok("Whisper", &settings.model),
        _ => CheckResult::warning(
            "Whisper",
            "OPENAI_API_KEY not set, recap transcribe is unavailable",
            "Set with: export OPENAI_API_KEY='sk-...' (or transcription.api_base)",
        ),
    }
}

/// Check analysis settings.
fn check_analysis(settings: &Settings) -> Vec<CheckResult> {
    let analysis = &settings.analysis;
    let mut results = Vec::new();

    match analysis.validate() {
        Ok(()) => results.push(CheckResult::ok(
            "Limits",
            &format!(
                "chunks of {} chars, {} call(s) at a time",
                analysis.max_chunk_size, analysis.max_concurrent
            ),
        )),
        Err(e) => results.push(CheckResult::error(
            "Limits",
            &e.to_string(),
            "Fix the [analysis] section of the config file",
        )),
    }

    let enabled: Vec<&str> = [
        (analysis.summary, "summary"),
        (analysis.key_points, "key points"),
        (analysis.topics, "topics"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect();

    if enabled.is_empty() {
        results.push(CheckResult::warning(
            "Analyses",
            "all disabled",
            "Enable at least one of summary, key_points, topics",
        ));
    } else {
        results.push(CheckResult::ok("Analyses", &enabled.join(", ")));
    }

    results
}

/// Check the output directory.
fn check_output_dir(output_dir: &Path) -> CheckResult {
    if output_dir.is_dir() {
        CheckResult::ok("Output directory", &format!("{}", output_dir.display()))
    } else if output_dir.exists() {
        CheckResult::error(
            "Output directory",
            &format!("{} is not a directory", output_dir.display()),
            "Set general.output_dir (or RECAP_OUTPUT_DIR) to a directory",
        )
    } else {
        CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", output_dir.display()),
            "Directory will be created on first analysis",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: recap config edit",
        )
    }
}

/// Check the custom prompts directory.
fn check_prompts_dir(dir: &Path) -> CheckResult {
    if !dir.is_dir() {
        return CheckResult::warning(
            "Custom prompts",
            &format!("{} not found", dir.display()),
            "Built-in prompts will be used",
        );
    }

    let found: Vec<&str> = ["summary.toml", "key_points.toml", "topics.toml", "formatting.toml"]
        .into_iter()
        .filter(|name| dir.join(name).exists())
        .collect();

    if found.is_empty() {
        CheckResult::warning(
            "Custom prompts",
            &format!("no prompt files in {}", dir.display()),
            "Add summary.toml, key_points.toml, topics.toml or formatting.toml",
        )
    } else {
        CheckResult::ok("Custom prompts", &found.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_disabled_analyses_warn() {
        let mut settings = Settings::default();
        settings.analysis.summary = false;
        settings.analysis.key_points = false;
        settings.analysis.topics = false;

        let results = check_analysis(&settings);
        assert_eq!(results[1].status, CheckStatus::Warning);
    }

    #[test]
    fn test_invalid_limits_are_errors() {
        let mut settings = Settings::default();
        settings.analysis.max_chunk_size = 0;

        let results = check_analysis(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
    }

    #[test]
    fn test_transcription_without_key_warns() {
        let settings = TranscriptionSettings::default();
        assert_eq!(check_transcription(&settings, None).status, CheckStatus::Warning);
        assert_eq!(check_transcription(&settings, Some("")).status, CheckStatus::Warning);
        assert_eq!(
            check_transcription(&settings, Some("sk-test")).status,
            CheckStatus::Ok
        );

        let local = TranscriptionSettings {
            api_base: Some("http://localhost:8000/v1".to_string()),
            ..Default::default()
        };
        assert_eq!(check_transcription(&local, None).status, CheckStatus::Ok);
    }

    #[test]
    fn test_output_dir_states() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_output_dir(dir.path()).status, CheckStatus::Ok);
        assert_eq!(
            check_output_dir(&dir.path().join("missing")).status,
            CheckStatus::Warning
        );

        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(check_output_dir(&file).status, CheckStatus::Error);
    }

    #[test]
    fn test_prompts_dir_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topics.toml"), "").unwrap();

        let result = check_prompts_dir(dir.path());
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "topics.toml");
    }
}
