//! CLI entry point for protofilter.
//!
//! This module is intentionally thin: it handles argument parsing, logging
//! setup, I/O and exit codes. All business logic lives in `protofilter-app`.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use protofilter_app::{FilterInput, run_filter, write_outputs, write_summary};
use protofilter_settings::Overrides;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "protofilter",
    version,
    about = "Filter out elements of .proto files based on their filter options"
)]
struct Cli {
    /// `.proto` files or directories to process.
    #[arg(value_name = "FILES")]
    inputs: Vec<String>,

    /// Path to add to the lookup path for imports (repeatable).
    #[arg(short, long = "include", value_name = "PATH")]
    include: Vec<String>,

    /// Directory to emit the processed files to [default: ./output].
    #[arg(short, long, value_name = "DIRECTORY")]
    output: Option<String>,

    /// A term to filter for (repeatable).
    #[arg(short, long = "term", value_name = "TERM")]
    term: Vec<String>,

    /// Path to protofilter config TOML. A missing file is fine.
    #[arg(short, long, default_value = "protofilter.toml")]
    config: Utf8PathBuf,

    /// Remove the filter options and the filter.proto import from the output.
    #[arg(long)]
    strip_policy: bool,

    /// Write a JSON summary of the run to this path.
    #[arg(long, value_name = "PATH")]
    summary: Option<Utf8PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    if let Err(err) = cmd_filter(cli) {
        eprintln!("protofilter error: {err:#}");
        std::process::exit(1);
    }
}

fn cmd_filter(cli: Cli) -> anyhow::Result<()> {
    // Missing file is allowed (defaults apply).
    let cfg_text = if cli.config.exists() {
        std::fs::read_to_string(&cli.config)
            .with_context(|| format!("read config: {}", cli.config))?
    } else {
        String::new()
    };

    let overrides = Overrides {
        inputs: cli.inputs,
        include_paths: cli.include,
        output: cli.output,
        terms: cli.term,
        strip_policy_options: cli.strip_policy,
    };

    let output = run_filter(FilterInput {
        config_text: &cfg_text,
        overrides,
    })?;

    write_outputs(&output.resolved_config.output, &output.files)
        .context("write filtered files")?;

    if let Some(path) = &cli.summary {
        write_summary(path, &output.summary).context("write run summary")?;
    }

    tracing::info!(
        written = output.summary.files_written.len(),
        dropped = output.summary.files_dropped.len(),
        output = %output.resolved_config.output,
        "done"
    );
    Ok(())
}
