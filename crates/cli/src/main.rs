// divrec CLI - config-driven dividend ledger reconciliation

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use divrec_recon::{AnalysisReport, RunConfig};

use exit_codes::{
    EXIT_RUN_DEGRADED, EXIT_RUN_INPUT, EXIT_RUN_INVALID_CONFIG, EXIT_RUN_OUTPUT,
    EXIT_RUN_PARTIAL, EXIT_SUCCESS,
};

#[derive(Parser)]
#[command(name = "divrec")]
#[command(about = "Reconcile NBIM and custody dividend ledgers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  divrec run daily.toml
  divrec run daily.toml --json
  divrec run daily.toml --summary-out summary.json")]
    Run {
        /// Path to the run config file
        config: PathBuf,

        /// Print the JSON run summary to stdout instead of the human one
        #[arg(long)]
        json: bool,

        /// Write the JSON run summary to file (overrides [output] summary)
        #[arg(long)]
        summary_out: Option<PathBuf>,
    },

    /// Validate a run config without running
    #[command(after_help = "\
Examples:
  divrec validate daily.toml")]
    Validate {
        /// Path to the run config file
        config: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn invalid_config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUN_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUN_INPUT, message: msg.into(), hint: None }
    }

    fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUN_OUTPUT, message: msg.into(), hint: None }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, summary_out } => cmd_run(config, json, summary_out),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    summary_out: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::input(format!("cannot read config: {e}")))?;
    let config = RunConfig::from_toml(&config_str)
        .map_err(|e| CliError::invalid_config(e.to_string()))?;

    // Input and output paths are relative to the config file's directory.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let nbim = divrec_recon::ingest::load_nbim_csv(&read_input(base_dir, &config.inputs.nbim)?)
        .map_err(|e| CliError::input(e.to_string()))?;
    let custody =
        divrec_recon::ingest::load_custody_csv(&read_input(base_dir, &config.inputs.custody)?)
            .map_err(|e| CliError::input(e.to_string()))?;
    let report = AnalysisReport::from_json(&read_input(base_dir, &config.inputs.report)?)
        .map_err(|e| CliError::input(e.to_string()))?;

    let out = divrec_recon::resolve(&nbim, &custody, &report, &config.tolerance);
    let summary = divrec_recon::summary::compute_summary(&out, nbim.len(), custody.len());

    // Corrected ledgers
    if let Some(ref rel) = config.output.nbim {
        write_ledger(base_dir, rel, &out.nbim)?;
    }
    if let Some(ref rel) = config.output.custody {
        write_ledger(base_dir, rel, &out.custody)?;
    }

    // Summary JSON
    let json_str = serde_json::to_string_pretty(&summary)
        .map_err(|e| CliError::output(format!("JSON serialization error: {e}")))?;

    let summary_path = summary_out
        .or_else(|| config.output.summary.as_ref().map(|rel| base_dir.join(rel)));
    if let Some(ref path) = summary_path {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!(
        "run '{}': {} proposals — {} applied, {} skipped; +{} NBIM rows, +{} custody rows",
        config.name,
        summary.proposals,
        summary.applied,
        summary.skipped,
        summary.rows_added_nbim,
        summary.rows_added_custody,
    );
    for reason in &summary.skip_reasons {
        eprintln!("  skipped: {reason}");
    }

    if summary.fallback_used {
        return Err(CliError {
            code: EXIT_RUN_DEGRADED,
            message: "analysis report was malformed; minimal fallback alignment ran".into(),
            hint: Some("corrected ledgers were still written; re-run once the report is fixed".into()),
        });
    }
    if summary.skipped > 0 {
        return Err(CliError {
            code: EXIT_RUN_PARTIAL,
            message: format!("{} proposal(s) skipped during application", summary.skipped),
            hint: None,
        });
    }

    Ok(())
}

fn read_input(base_dir: &Path, rel: &str) -> Result<String, CliError> {
    let path = base_dir.join(rel);
    std::fs::read_to_string(&path)
        .map_err(|e| CliError::input(format!("cannot read {}: {e}", path.display())))
}

fn write_ledger(
    base_dir: &Path,
    rel: &str,
    rows: &[divrec_recon::Record],
) -> Result<(), CliError> {
    let path = base_dir.join(rel);
    let csv = divrec_recon::export::ledger_to_csv(rows)
        .map_err(|e| CliError::output(e.to_string()))?;
    std::fs::write(&path, csv)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::input(format!("cannot read config: {e}")))?;

    match RunConfig::from_toml(&config_str) {
        Ok(config) => {
            eprintln!(
                "valid: run '{}' (nbim: {}, custody: {}, report: {})",
                config.name, config.inputs.nbim, config.inputs.custody, config.inputs.report,
            );
            Ok(())
        }
        Err(e) => Err(CliError::invalid_config(e.to_string())),
    }
}
