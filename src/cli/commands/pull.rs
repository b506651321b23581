//! Pull command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{BackendArgs, Output};
use crate::config::Settings;
use crate::generation::OllamaGenerator;
use anyhow::Result;

/// Run the pull command.
pub async fn run_pull(backend: &BackendArgs, mut settings: Settings) -> Result<()> {
    backend.apply(&mut settings)?;

    if let Err(e) = preflight::check(Operation::Pull, &settings.backend).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let ollama = OllamaGenerator::from_settings(&settings.backend)?;
    if ollama.has_model().await? {
        Output::success(&format!("Model {} is already installed", settings.backend.model));
        return Ok(());
    }

    let spinner = Output::spinner(&format!(
        "Downloading {} (this may take a while)...",
        settings.backend.model
    ));
    let result = ollama.pull_model().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            Output::success(&format!("Model {} downloaded", settings.backend.model));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to pull {}: {}", settings.backend.model, e));
            Err(e.into())
        }
    }
}
