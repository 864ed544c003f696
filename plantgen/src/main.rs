//! Command-line entry point.
//!
//! Thin collaborator around the library: reads the diagram, wires the sinks,
//! writes the generated header/source pair next to each other in the output
//! directory, and maps the outcome to an exit code (0 on success, 1 on I/O
//! or unrecoverable generation errors).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use plantgen::{Config, LogSink, generate};

#[derive(Parser)]
#[command(name = "plantgen")]
#[command(about = "Generates C++ state machine code from PlantUML state diagrams", long_about = None)]
#[command(version)]
struct Cli {
    /// Input PlantUML file.
    input: PathBuf,

    /// Directory for the generated header/source pair.
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,

    /// Log every parsed entity while reading the diagram.
    #[arg(short, long)]
    verbose: bool,

    /// Name states by their leaf name only instead of parent-qualified.
    #[arg(long)]
    simple_names: bool,

    /// Leave the trace hooks out of the generated machine.
    #[arg(long)]
    no_tracing: bool,

    /// Evaluate a state's own transitions before its parent's.
    #[arg(long)]
    child_first: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|e| format!("failed to read {}: {e}", cli.input.display()))?;

    // The file stem stands in for a missing `model` directive, like the
    // original tool's default.
    let fallback_model_name = cli
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned);

    let config = Config {
        verbose: cli.verbose,
        tracing: !cli.no_tracing,
        simple_names: cli.simple_names,
        parent_first_execution: !cli.child_first,
        fallback_model_name,
    };

    let mut header = String::new();
    let mut body = String::new();
    let mut diags = LogSink;
    let summary = generate(
        source.lines().map(str::to_owned),
        &mut header,
        &mut body,
        &mut diags,
        &config,
    )
    .map_err(|e| e.to_string())?;

    let mut file_base = summary.model_name.clone();
    if let Some(first) = file_base.get_mut(0..1) {
        first.make_ascii_lowercase();
    }

    fs::create_dir_all(&cli.outdir)
        .map_err(|e| format!("failed to create {}: {e}", cli.outdir.display()))?;
    let header_path = cli.outdir.join(format!("{file_base}.h"));
    let body_path = cli.outdir.join(format!("{file_base}.cpp"));
    fs::write(&header_path, header)
        .map_err(|e| format!("failed to write {}: {e}", header_path.display()))?;
    fs::write(&body_path, body)
        .map_err(|e| format!("failed to write {}: {e}", body_path.display()))?;

    info!(
        "generated {} and {} ({} errors, {} warnings)",
        header_path.display(),
        body_path.display(),
        summary.errors,
        summary.warnings
    );
    Ok(())
}
