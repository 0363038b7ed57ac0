// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            manifest,
            target,
            backup_prefix,
            quiet,
        } => {
            let code = commands::cmd_install(&manifest, &target, &backup_prefix, quiet)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Plan { manifest, target } => commands::cmd_plan(&manifest, &target),
    }
}
