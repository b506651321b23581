//! Format command implementation.

use crate::cli::preflight::{self, Operation, Preflight};
use crate::cli::{apply_output_overrides, BackendArgs, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the format command.
pub async fn run_format(
    input: &str,
    backend: &BackendArgs,
    output_dir: Option<&str>,
    skip_preflight: bool,
    mut settings: Settings,
) -> Result<()> {
    backend.apply(&mut settings)?;
    apply_output_overrides(&mut settings, output_dir, None)?;

    if !skip_preflight {
        match preflight::check(Operation::Generate, &settings.backend).await {
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

    let out_dir = settings.output_dir();
    let orchestrator = Orchestrator::new(settings)?;
    let formatter = orchestrator.formatter();

    let inputs = formatter.list_inputs(input).await?;
    if inputs.is_empty() {
        Output::warning(&format!("No transcriptions to format in {}", input));
        return Ok(());
    }

    Output::info(&format!("Formatting {} file(s)", inputs.len()));
    let pb = Output::progress_bar(inputs.len() as u64, "formatting");

    let mut formatted = 0;
    let mut failed = Vec::new();
    for path in &inputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name.clone());

        match formatter.format_file(path, &out_dir).await {
            Ok(Some(_)) => formatted += 1,
            Ok(None) => pb.println(format!("  skipped empty file {}", name)),
            Err(e) => failed.push(format!("{}: {}", name, e)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for failure in &failed {
        Output::error(failure);
    }
    Output::success(&format!(
        "Formatted {}/{} file(s) into {}",
        formatted,
        inputs.len(),
        out_dir.display()
    ));

    Ok(())
}
