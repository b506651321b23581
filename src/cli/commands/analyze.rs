//! Analyze command implementation.

use crate::cli::preflight::{self, Operation, Preflight};
use crate::cli::{apply_output_overrides, AnalysisArgs, BackendArgs, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the analyze command.
pub async fn run_analyze(
    input: &str,
    backend: &BackendArgs,
    analysis: &AnalysisArgs,
    output_dir: Option<&str>,
    format: Option<&str>,
    skip_preflight: bool,
    mut settings: Settings,
) -> Result<()> {
    backend.apply(&mut settings)?;
    analysis.apply(&mut settings);
    apply_output_overrides(&mut settings, output_dir, format)?;

    if !settings.analysis.any_enabled() {
        Output::warning("Every analysis is disabled, nothing to do.");
        return Ok(());
    }

    if !skip_preflight {
        let spinner = Output::spinner("Checking backend...");
        let outcome = preflight::check(Operation::Generate, &settings.backend).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(Preflight::ModelPulled) => {
                Output::success(&format!("Downloaded model {}", settings.backend.model))
            }
            Ok(Preflight::Ready) => {}
            Err(e) => {
                Output::error(&format!("{}", e));
                Output::info("Run 'recap doctor' for detailed diagnostics.");
                return Err(e.into());
            }
        }
    }

    Output::info(&format!("Analyzing: {}", input));
    Output::kv("Model", &settings.backend.model);
    Output::kv("Output", &settings.output_dir().display().to_string());

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Generating analyses (this may take a while)...");
    let result = orchestrator.run(input).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Failed to analyze: {}", e));
            return Err(e.into());
        }
    };

    if report.total() == 0 {
        Output::warning(&format!(
            "No transcriptions found in {} (expected files ending in '{}')",
            input,
            orchestrator.settings().source.suffix
        ));
        return Ok(());
    }

    Output::run_report(&report);

    Ok(())
}
