#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use reportkit::cli::app::{Cli, Command, RuntimeArgs};
use reportkit::cli::commands;
use reportkit::config::RuntimePaths;
use reportkit::models::CommandEnvelopeFailure;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_VALIDATION_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    init_logging(cli.runtime.verbose);

    let command_name = command_name(&cli.command);
    println!("reportkit: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            println!("reportkit: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("reportkit: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    if let Err(error) = simple_logger::init_with_level(level) {
        eprintln!("reportkit: logging unavailable: {error}");
    }
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::validate::run(&args, &runtime_paths)
        }
        Command::Compare(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::compare::run(&args, &runtime_paths)
        }
        Command::Drilldown(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::drilldown::run(&args, &runtime_paths)
        }
        Command::Operators(args) => commands::operators::run(&args),
        Command::Schema(args) => commands::schema::run(&args),
        Command::Saved(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::saved::run(&args, &runtime_paths)
        }
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CommandEnvelopeFailure>() {
        Some(failure) if failure.is_validation() => EXIT_VALIDATION_FAILURE,
        _ => EXIT_RUNTIME_FAILURE,
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Validate(_) => "validate",
        Command::Compare(_) => "compare",
        Command::Drilldown(_) => "drilldown",
        Command::Operators(_) => "operators",
        Command::Schema(_) => "schema",
        Command::Saved(_) => "saved",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    Ok(RuntimePaths::new(&home_dir, &cwd, args.out_dir.as_deref())?)
}
