// src/commands.rs
//! Command implementations

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use safe_unpack::{
    BackupActionKind, InstallOutcome, Installer, InstallerConfig, Manifest, StatusSink,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Exit status for a run that stopped after some packages were installed
pub const EXIT_PARTIAL: i32 = 2;
/// Exit status for a run that installed nothing
pub const EXIT_FAILED: i32 = 3;

/// Status sink that drives a terminal spinner
///
/// Every message is kept in the scrollback; the spinner shows the latest.
struct ConsoleStatus {
    bar: ProgressBar,
}

impl ConsoleStatus {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StatusSink for ConsoleStatus {
    fn notify(&self, message: &str) {
        self.bar.println(message);
        self.bar.set_message(message.to_string());
    }
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::from_file(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))
}

/// Run an install and return the process exit code
pub fn cmd_install(
    manifest: &Path,
    target: &Path,
    backup_prefix: &str,
    quiet: bool,
) -> Result<i32> {
    let manifest = load_manifest(manifest)?;
    info!(
        "Loaded {} package(s), installing into {}",
        manifest.len(),
        target.display()
    );

    let config = InstallerConfig::new(target).with_backup_prefix(backup_prefix);
    let mut installer = Installer::new(manifest, config);

    let console = (!quiet).then(|| Arc::new(ConsoleStatus::new()));
    if let Some(console) = &console {
        installer = installer.with_status(console.clone());
    }

    let report = installer.install();
    if let Some(console) = &console {
        console.finish();
    }

    match (&report.backup_root, report.backup_retained) {
        (Some(root), true) => println!(
            "Backed up {} existing entr{} to {}",
            report.backed_up.len(),
            if report.backed_up.len() == 1 { "y" } else { "ies" },
            root.display()
        ),
        _ => println!("Nothing needed backing up"),
    }

    match report.outcome {
        InstallOutcome::Completed => {
            println!(
                "Installed {} package(s): {} files, {} bytes",
                report.packages_installed, report.extracted.files, report.extracted.bytes
            );
            Ok(0)
        }
        InstallOutcome::Partial | InstallOutcome::Failed => {
            if let Some(err) = &report.error {
                eprintln!("Install failed: {}", err);
            }
            eprintln!(
                "{} package(s) were installed before the failure",
                report.packages_installed
            );
            Ok(if report.outcome == InstallOutcome::Partial {
                EXIT_PARTIAL
            } else {
                EXIT_FAILED
            })
        }
    }
}

/// Print the backup plan for a manifest without changing anything
pub fn cmd_plan(manifest: &Path, target: &Path) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let installer = Installer::new(manifest, InstallerConfig::new(target));
    let plans = installer.plan()?;

    let mut conflicts = 0;
    for plan in &plans {
        println!("{}:", plan.description);
        for action in &plan.actions {
            let marker = match action.kind {
                BackupActionKind::Move => "backup",
                BackupActionKind::Skip => "new",
                BackupActionKind::TypeMismatch => "mismatch",
            };
            println!(
                "  [{:>8}] {} ({})",
                marker, action.entry.name, action.entry.entry_type
            );
        }
        conflicts += plan.conflicts().count();
    }

    println!();
    println!(
        "{} existing entr{} would be backed up",
        conflicts,
        if conflicts == 1 { "y" } else { "ies" }
    );
    Ok(())
}
