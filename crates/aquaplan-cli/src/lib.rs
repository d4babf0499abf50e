// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod logging;
mod run_command;
mod scenario;
mod settings;
mod view_command;

use aquaplan_core::{resolve_aquaplan_cache_dir, ErrorCode, ExitCode, MachineError};
use aquaplan_pipeline::{PipelineConfig, Stage, StageError, CONFIG_SCHEMA_VERSION};
use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use logging::{init_tracing, LogFlags};
use run_command::{run_scenario, RunArgs};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use view_command::{run_view, TableName, ViewArgs};

const AQUAPLAN_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "aquaplan", version)]
#[command(about = "Groundwater recharge, demand and stress assessment pipeline")]
#[command(help_template = AQUAPLAN_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  AQUAPLAN_API_BASE_URL   Compute API base url\n  AQUAPLAN_LOG_LEVEL      Log verbosity override\n  AQUAPLAN_LOG_JSON       Emit logs as JSON\n  AQUAPLAN_CACHE_DIR      Client-local storage root"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Config file; defaults to .aquaplan/config.json, then the user config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file through every stage and hand off the result.
    Run {
        #[arg(long)]
        scenario: PathBuf,
        /// Planning horizon in years; overrides the scenario.
        #[arg(long)]
        horizon: Option<String>,
        /// Write the full report snapshot as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        skip_handoff: bool,
    },
    /// Search and sort one table of a saved report.
    View {
        #[arg(long)]
        report: PathBuf,
        #[arg(long, value_enum)]
        table: TableName,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    /// Validate and print the effective configuration.
    Check,
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    Version,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputMode {
    pub json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new(ErrorCode::Usage, "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new(ErrorCode::Usage, "missing command; see --help"),
    })?;
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
    });

    match command {
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
        Commands::Version => {
            print_version(output_mode);
            Ok(())
        }
        Commands::Check => {
            let loaded = settings::load_config(cli.config.as_deref()).map_err(CliError::config)?;
            print_check(&loaded, output_mode);
            Ok(())
        }
        Commands::Run {
            scenario,
            horizon,
            report,
            skip_handoff,
        } => {
            let loaded = settings::load_config(cli.config.as_deref()).map_err(CliError::config)?;
            run_scenario(
                RunArgs {
                    scenario,
                    horizon,
                    report,
                    skip_handoff,
                },
                loaded.config,
                output_mode,
            )
        }
        Commands::View {
            report,
            table,
            search,
            sort,
            desc,
        } => run_view(
            ViewArgs {
                report,
                table,
                search,
                sort,
                descending: desc,
            },
            output_mode,
        ),
    }
}

fn print_completion<G: Generator>(generator: G) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(generator, &mut command, name, &mut std::io::stdout());
}

fn print_version(output_mode: OutputMode) {
    let version = env!("CARGO_PKG_VERSION");
    if output_mode.json {
        println!(
            "{}",
            json!({
                "name": "aquaplan",
                "version": version,
                "config_schema_version": CONFIG_SCHEMA_VERSION,
            })
        );
    } else {
        println!("aquaplan {version}");
    }
}

fn redacted(config: &PipelineConfig) -> PipelineConfig {
    let mut shown = config.clone();
    if shown.backend.bearer.is_some() {
        shown.backend.bearer = Some("***".to_string());
    }
    shown
}

fn print_check(loaded: &settings::LoadedConfig, output_mode: OutputMode) {
    let source = loaded
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let storage = settings::storage_dir(&loaded.config);
    if output_mode.json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "source": source,
                "cache_dir": resolve_aquaplan_cache_dir().display().to_string(),
                "storage_dir": storage.display().to_string(),
                "config": redacted(&loaded.config),
            })
        );
    } else {
        println!("config ok ({source})");
        println!("api: {}", loaded.config.backend.base_url);
        println!("downstream: {}", loaded.config.handoff.downstream_url);
        println!("storage: {}", storage.display());
    }
}

#[derive(Debug)]
pub(crate) struct CliError {
    pub(crate) exit_code: ExitCode,
    pub(crate) machine: MachineError,
}

impl CliError {
    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new(ErrorCode::Internal, &message),
        }
    }

    pub(crate) fn validation(message: String) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new(ErrorCode::InvalidInput, &message),
        }
    }

    fn config(message: String) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new(ErrorCode::InvalidConfig, &message),
        }
    }

    pub(crate) fn from_stage(stage: Stage, err: &StageError) -> Self {
        Self {
            exit_code: err.error_code().exit_code(),
            machine: err.to_machine_error(stage),
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}
