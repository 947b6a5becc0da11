use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use provision_cli::cli::{Cli, Command};
use provision_cli::commands;
use provision_cli::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match args.command_or_default() {
        Command::Install => {
            init_subscriber(args.verbose, "install");
            let log = Arc::new(Logger::new("install"));
            commands::install::run(&args.global, &log)
        }
        Command::Version => {
            let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("provision {version}");
            Ok(())
        }
    }
}
