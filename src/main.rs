// src/main.rs

use clap::error::ErrorKind;
use clap::Parser;
use helmhub_builder::{CookFailure, Error};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "helmhub-build")]
#[command(author, version, about = "Build a container image from a named recipe", long_about = None)]
struct Cli {
    /// Image name; selects recipes/<IMAGE>.yaml and images/<IMAGE>/
    image: String,

    /// Builder configuration file (default: ./helmhub.toml, then <config dir>/helmhub/builder.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding recipe files
    #[arg(long)]
    recipes_dir: Option<PathBuf>,

    /// Directory holding image definitions
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Scratch directory, wiped at the start of every run
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Image namespace for the produced tag
    #[arg(long)]
    namespace: Option<String>,

    /// Per-command timeout in seconds (0 = no limit)
    #[arg(long)]
    timeout: Option<u64>,

    /// Only load and validate the recipe, then print the build plan
    #[arg(long)]
    validate: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Map a failure to the process exit status
///
/// A failing external command's status is passed through; anything else is 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = if let Some(failure) = err.downcast_ref::<CookFailure>() {
        failure.exit_code()
    } else if let Some(error) = err.downcast_ref::<Error>() {
        error.exit_code()
    } else {
        1
    };
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::from(1);
            }
        },
    };

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let overrides = commands::ConfigOverrides {
        recipes_dir: cli.recipes_dir,
        images_dir: cli.images_dir,
        workspace_dir: cli.workspace,
        namespace: cli.namespace,
        timeout_secs: cli.timeout,
    };

    let result = commands::resolve_config(cli.config.as_deref(), overrides).and_then(|config| {
        if cli.validate {
            commands::cmd_validate(&cli.image, config)
        } else {
            commands::cmd_cook(&cli.image, config)
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}
