mod azure_devops;
mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod options;
mod ui;
mod wiql;

use anyhow::Result;
use clap::Parser;
use cli::{ApiCommand, Cli, Commands};
use std::process::ExitCode;

use crate::azure_devops::AzureDevOpsClient;
use crate::config::Config;
use crate::error::UsageError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    logging::init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Option<Commands>) -> Result<()> {
    match command.unwrap_or(Commands::Api(ApiCommand::Smoke)) {
        Commands::Init { local } => commands::init(local),
        Commands::Config => commands::config_show(),
        Commands::Api(command) => {
            let config = Config::resolve()?;
            let client = AzureDevOpsClient::new(&config)?;
            commands::run(command, &config, &client).await
        }
    }
}

fn report(err: &anyhow::Error) {
    if let Some(usage) = err.downcast_ref::<UsageError>() {
        eprintln!("{}", usage.message);
        if let Some(line) = usage.usage {
            eprintln!("Usage: ado {line}");
        }
        return;
    }

    eprintln!("error: {err:#}");
}
