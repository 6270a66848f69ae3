//! # aider-run-cli
//!
//! Binary entry point for aider-run.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Logging setup (all diagnostics go to stderr)
//! - Wiring of the aider backend into the core `Entrypoint`
//! - Mapping of any failure to exit code 1

mod input;

use aider_run_adapters::AiderBackend;
use aider_run_core::{Entrypoint, EntrypointError, Host, RunRequest};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Color output mode for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stderr is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// Returns true if colors should be used based on mode and terminal detection.
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stderr().is_terminal(),
        }
    }
}

/// How much aider-run itself reports. The agent's own output is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Progress lines (default)
    #[default]
    Normal,
    /// Also resolved arguments and environment overrides
    Verbose,
}

impl Verbosity {
    /// `--quiet` wins over `--verbose` and over the request's `verbose` field.
    fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    fn filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Run the aider coding agent from a JSON run request
#[derive(Parser, Debug)]
#[command(name = "aider-run", version, about)]
struct Cli {
    /// Run request as a JSON object, or `-` to read it from stdin.
    ///
    /// Keys: prompt (required), editableFiles, readOnlyFiles, modelName,
    /// apiKey, apiBase, repoPath, autoCommits, verbose.
    #[arg(value_name = "CONFIG_JSON")]
    config_json: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Color output mode (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// aider executable to run (name on PATH or path)
    #[arg(long, env = "AIDER_RUN_AIDER_BIN", value_name = "PATH")]
    aider_bin: Option<PathBuf>,

    /// Print the aider command line instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(verbosity: Verbosity, color: ColorMode) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_ansi(color.should_use_colors())
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let input = input::read_request_input(&cli.config_json, std::io::stdin().lock())?;

    // Decode before logging is up so the request's own `verbose` flag counts.
    let decoded = RunRequest::from_json(&input);
    let request_verbose = decoded.as_ref().is_ok_and(|request| request.verbose);
    init_logging(
        Verbosity::from_flags(cli.verbose || request_verbose, cli.quiet),
        cli.color,
    );
    let request = decoded?;

    let host = Host::detect();
    debug!("Invoked from {:?}", host.current_dir);

    let mut backend = AiderBackend::new().with_dry_run(cli.dry_run);
    if let Some(binary) = cli.aider_bin {
        backend = backend.with_binary(binary);
    }

    Entrypoint::new(backend, host).run(request).await?;
    Ok(())
}

/// Renders a fatal error for stderr.
///
/// Agent failures keep the `Error initializing aider: ...` /
/// `Error during aider execution: ...` wording callers match on; everything
/// else is `Error: ` plus the full cause chain.
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<EntrypointError>() {
        Some(EntrypointError::Initialization(source)) => {
            format!("Error initializing aider: {}", cause_chain(source))
        }
        Some(EntrypointError::Execution(source)) => {
            format!("Error during aider execution: {}", cause_chain(source))
        }
        _ => format!("Error: {err:#}"),
    }
}

fn cause_chain(err: &(dyn std::error::Error + 'static)) -> String {
    std::iter::successors(Some(err), |e| e.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}
