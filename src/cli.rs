//! The minimal CLI front-end: wires the pipeline's
//! steps to a terminal, prints findings as plain lines, and
//! returns the appropriate process exit code. Contains no analysis logic of its own.

use std::path::PathBuf;

use clap::Parser;

use doxy::config::Config;
use doxy::error::{Result, EXIT_FINDINGS_PRESENT, EXIT_OK};
use doxy::pipeline;

#[derive(Parser, Debug)]
#[command(name = "doxy", about = "Static API-compatibility verifier")]
pub struct Cli {
    /// Project root to analyze.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Root directory of the curated authority data (manifest.json + per-package specs).
    #[arg(long)]
    pub authority: PathBuf,

    /// Git ref to diff changed files against.
    #[arg(long)]
    pub base_ref: Option<String>,

    /// Include findings at or below `severity` that are normally suppressed in the listing.
    #[arg(long)]
    pub include_suppressed: bool,
}

/// Runs the pipeline for one CLI invocation and returns the process exit
/// code.
pub fn run(cli: &Cli) -> Result<i32> {
    let config = Config::load(&cli.root)?;
    let outcome = pipeline::run(&cli.root, &config, cli.base_ref.as_deref(), &cli.authority)?;

    let visible: Vec<_> = outcome
        .findings
        .iter()
        .filter(|f| cli.include_suppressed || f.suppressed.is_none())
        .filter(|f| f.severity >= config.severity)
        .collect();

    for finding in &visible {
        println!("{} {} {}", finding.long_id, finding.id, finding.message);
    }

    let exit_code_present = visible.iter().any(|f| f.suppressed.is_none() && f.severity >= config.fail_on);

    Ok(if exit_code_present { EXIT_FINDINGS_PRESENT } else { EXIT_OK })
}

pub fn install_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
}
