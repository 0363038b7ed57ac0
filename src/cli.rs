// src/cli.rs
//! CLI definitions for safe-unpack
//!
//! The command implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use safe_unpack::DEFAULT_BACKUP_PREFIX;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "safe-unpack")]
#[command(version)]
#[command(about = "Install archive packages, backing up anything they would overwrite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Back up conflicting entries and extract every package into the target
    Install {
        /// Package manifest (TOML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Directory to install into
        #[arg(short, long)]
        target: PathBuf,

        /// Name prefix for the backup directory created under the target
        #[arg(long, default_value = DEFAULT_BACKUP_PREFIX)]
        backup_prefix: String,

        /// Only print the final result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show which existing entries an install would back up
    Plan {
        /// Package manifest (TOML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Directory to install into
        #[arg(short, long)]
        target: PathBuf,
    },
}
