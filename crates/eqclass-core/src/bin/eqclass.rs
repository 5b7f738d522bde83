//! CLI entrypoint for equivalence-class differential testing.
//!
//! Exit codes: 0 PASS, 1 FAIL, 2 configuration, usage or I/O error.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use eqclass_core::error::HarnessError;
use eqclass_core::executor::{DifferentialExecutor, RunConfig};
use eqclass_core::limits::RunLimits;
use eqclass_core::log::{LogEmitter, LogLevel};
use eqclass_core::manifest::run_suite;
use eqclass_core::pipeline::{build_cases, load_model};
use eqclass_core::report::{overall_status, RunStatus};
use eqclass_core::verdict::Normalization;
use eqclass_exec::config::{ExecConfig, InputMode};
use eqclass_exec::process::ProcessImplementation;
use eqclass_explore::sampler::{RandomSampler, DEFAULT_SEED};

/// Differential testing of two implementations over equivalence classes.
#[derive(Debug, Parser)]
#[command(name = "eqclass")]
#[command(about = "Equivalence-class differential testing harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run reference and subject over every generated case.
    Run {
        /// Partition configuration (JSON).
        #[arg(long)]
        config: PathBuf,
        /// Reference command line. Split on whitespace with no shell
        /// quoting; wrap arguments containing spaces in a script, or use a
        /// suite manifest with an explicit `args` list.
        #[arg(long)]
        reference: String,
        /// Subject command line, split like --reference.
        #[arg(long)]
        subject: String,
        /// Per-invocation timeout in milliseconds.
        #[arg(long, default_value_t = 1000)]
        timeout: u64,
        /// Worker threads.
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// How case values reach the programs.
        #[arg(long, value_enum, default_value_t = InputArg::Stdin)]
        input: InputArg,
        /// Output normalization before comparison.
        #[arg(long, value_enum, default_value_t = NormalizeArg::Exact)]
        normalize: NormalizeArg,
        /// Seeded random samples appended after the deterministic cases.
        #[arg(long)]
        sample: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Structured JSONL log file (stderr if omitted and --log-level is set).
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Print the generated cases as JSON without executing anything.
    Cases {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        sample: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Run every suite listed in a pairing manifest.
    Suite {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long, default_value_t = 1)]
        workers: usize,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputArg {
    Stdin,
    Args,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NormalizeArg {
    Exact,
    Trim,
    Collapse,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(RunStatus::Pass) => ExitCode::SUCCESS,
        Ok(RunStatus::Fail) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn execute(command: Command) -> Result<RunStatus, HarnessError> {
    match command {
        Command::Run {
            config,
            reference,
            subject,
            timeout,
            workers,
            input,
            normalize,
            sample,
            seed,
            format,
            output,
            log,
            log_level,
        } => {
            let limits = RunLimits::default();
            let model = load_model(&config, &limits)?;
            let sampler = sample.map(|count| RandomSampler::new(seed, count));
            let cases = build_cases(&model, sampler.as_ref(), &limits)?;

            let exec_config = ExecConfig {
                input: match input {
                    InputArg::Stdin => InputMode::Stdin,
                    InputArg::Args => InputMode::Args,
                },
                ..ExecConfig::default()
            };
            let reference = ProcessImplementation::from_command_line(&reference)?
                .with_config(exec_config.clone());
            let subject =
                ProcessImplementation::from_command_line(&subject)?.with_config(exec_config);

            let run_config = RunConfig {
                timeout: Duration::from_millis(timeout),
                workers,
                normalization: match normalize {
                    NormalizeArg::Exact => Normalization::Exact,
                    NormalizeArg::Trim => Normalization::Trim,
                    NormalizeArg::Collapse => Normalization::Collapse,
                },
                limits,
            };
            let emitter = open_log(log.as_deref(), log_level.as_deref(), "run")?;
            let executor =
                DifferentialExecutor::new(Arc::new(reference), Arc::new(subject), run_config);
            let report = executor.run(&cases, emitter.as_ref())?;

            let rendered = match format {
                Format::Table => report.render_table(),
                Format::Json => report.to_json().map_err(|e| {
                    HarnessError::InvalidConfig(format!("cannot serialize report: {e}"))
                })?,
            };
            write_output(output.as_deref(), &rendered)?;
            Ok(report.status)
        }
        Command::Cases {
            config,
            sample,
            seed,
        } => {
            let limits = RunLimits::default();
            let model = load_model(&config, &limits)?;
            let sampler = sample.map(|count| RandomSampler::new(seed, count));
            let cases = build_cases(&model, sampler.as_ref(), &limits)?;
            let json = serde_json::to_string_pretty(&cases).map_err(|e| {
                HarnessError::InvalidConfig(format!("cannot serialize cases: {e}"))
            })?;
            println!("{json}");
            Ok(RunStatus::Pass)
        }
        Command::Suite {
            manifest,
            workers,
            format,
            output,
            log,
            log_level,
        } => {
            let config = RunConfig {
                workers,
                ..RunConfig::default()
            };
            let emitter = open_log(log.as_deref(), log_level.as_deref(), "suite")?;
            let reports = run_suite(&manifest, &config, emitter.as_ref())?;
            let rendered = match format {
                Format::Table => reports
                    .iter()
                    .map(|r| r.render_table())
                    .collect::<Vec<_>>()
                    .join("\n"),
                Format::Json => serde_json::to_string_pretty(&reports).map_err(|e| {
                    HarnessError::InvalidConfig(format!("cannot serialize report: {e}"))
                })?,
            };
            write_output(output.as_deref(), &rendered)?;
            Ok(overall_status(&reports))
        }
    }
}

/// A log file, or stderr when only a level is given. No log otherwise.
fn open_log(
    path: Option<&Path>,
    level: Option<&str>,
    run_id: &str,
) -> Result<Option<LogEmitter>, HarnessError> {
    let level = level
        .map(str::parse::<LogLevel>)
        .transpose()
        .map_err(HarnessError::InvalidConfig)?;
    let emitter = match (path, level) {
        (Some(path), _) => LogEmitter::to_file(path, run_id).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?,
        (None, Some(_)) => LogEmitter::to_stderr(run_id),
        (None, None) => return Ok(None),
    };
    Ok(Some(emitter.with_min_level(level.unwrap_or(LogLevel::Info))))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), HarnessError> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}
