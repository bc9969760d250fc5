//! `converge` command-line entry point.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use converge::cli::{self, Command};
use converge::commands;
use converge::logging::{self, Log as _, Logger};

/// Exit status of `apply --detailed-exitcode` when something changed.
const EXIT_CHANGED: u8 = 2;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command_name = match &args.command {
        Command::Apply(_) => "apply",
        Command::Set(_) => "set",
        Command::Detect(_) => "detect",
        Command::Version => {
            return commands::version::run().map_or(ExitCode::FAILURE, |()| ExitCode::SUCCESS);
        }
    };
    let log_file = logging::init_subscriber(args.verbose, command_name);
    let log = Arc::new(Logger::new(log_file));

    let result = match &args.command {
        Command::Apply(opts) => commands::apply::run(&args.global, opts, &log).map(|changed| {
            if changed && opts.detailed_exitcode {
                ExitCode::from(EXIT_CHANGED)
            } else {
                ExitCode::SUCCESS
            }
        }),
        Command::Set(opts) => commands::set::run(&args.global, opts, &log).map(|_| ExitCode::SUCCESS),
        Command::Detect(opts) => commands::detect::run(opts).map(|()| ExitCode::SUCCESS),
        Command::Version => Ok(ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|e| {
        log.error(&format!("{e:#}"));
        ExitCode::FAILURE
    })
}
