//! treepack CLI - pack directory trees into tar.gz or zip archives and
//! restore them with their metadata.

mod cli;
mod commands;
mod error;
mod logger;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match run(&cli, &*formatter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            formatter.format_error(cli.command.name(), &err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &cli::Cli, formatter: &dyn OutputFormatter) -> Result<()> {
    match &cli.command {
        cli::Commands::Create(args) => commands::create::execute(args, formatter),
        cli::Commands::Extract(args) => commands::extract::execute(args, formatter),
        cli::Commands::List(args) => commands::list::execute(args, formatter),
        cli::Commands::Completion { shell } => {
            commands::completion::execute(*shell);
            Ok(())
        }
    }
}
