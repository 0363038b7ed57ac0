// src/installer/mod.rs

//! Install orchestration
//!
//! An install walks the manifest in order. For each package it first moves
//! any conflicting entries into the run's backup root, then extracts the
//! package archive over the target:
//!
//! ```text
//! Idle -> BackingUp(0) -> Extracting(0) -> BackingUp(1) -> ... -> Finalizing -> Done
//!                 \______________ any error ______________/          \-> Failed
//! ```
//!
//! Failures never escape [`Installer::install`]. The error text is sent to
//! the status sink (so the last message is either the error or
//! "Installation is complete!") and the details come back in an
//! [`InstallReport`]. There is no rollback: packages extracted before the
//! failure stay extracted, and whatever was backed up stays in the backup
//! root.

mod report;

pub use report::{InstallOutcome, InstallReport};

use crate::archive::{ArchiveExtractor, DefaultExtractor, ExtractStats};
use crate::backup::{BackedUpEntry, BackupPlan, BackupPlanner, BackupRoot};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::progress::{SilentStatus, StatusSink};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// Prefix of the per-run backup directory name
pub const DEFAULT_BACKUP_PREFIX: &str = "install-backup";

/// Final status message of a successful run
pub const COMPLETE_MESSAGE: &str = "Installation is complete!";

/// Installer configuration
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Directory the packages are installed into
    pub target: PathBuf,
    /// Backup directories are named `<backup_prefix>-<uuid>`
    pub backup_prefix: String,
}

impl InstallerConfig {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
        }
    }

    pub fn with_backup_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.backup_prefix = prefix.into();
        self
    }
}

/// Install state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// Nothing done yet
    Idle,
    /// Moving conflicts of package `n` into the backup root
    BackingUp(usize),
    /// Unpacking the archive of package `n`
    Extracting(usize),
    /// All packages extracted, cleaning up the backup root
    Finalizing,
    Done,
    Failed,
}

impl InstallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Index of the package being worked on, if any
    pub fn package_index(&self) -> Option<usize> {
        match self {
            Self::BackingUp(index) | Self::Extracting(index) => Some(*index),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::BackingUp(index) => write!(f, "backing up package {}", index),
            Self::Extracting(index) => write!(f, "extracting package {}", index),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Bookkeeping for one run, turned into the report at the end
#[derive(Default)]
struct RunProgress {
    backup_root: Option<PathBuf>,
    backed_up: Vec<BackedUpEntry>,
    packages_installed: usize,
    last_completed: Option<usize>,
    extracted: ExtractStats,
}

impl RunProgress {
    fn record_extracted(&mut self, index: usize, stats: ExtractStats) {
        self.packages_installed += 1;
        self.last_completed = Some(index);
        self.extracted.files += stats.files;
        self.extracted.directories += stats.directories;
        self.extracted.bytes += stats.bytes;
        self.extracted.skipped += stats.skipped;
    }
}

/// Installs the packages of a manifest into a target directory
pub struct Installer {
    manifest: Manifest,
    config: InstallerConfig,
    status: Arc<dyn StatusSink>,
    extractor: Arc<dyn ArchiveExtractor>,
    state: Cell<InstallState>,
}

impl Installer {
    pub fn new(manifest: Manifest, config: InstallerConfig) -> Self {
        Self {
            manifest,
            config,
            status: Arc::new(SilentStatus),
            extractor: Arc::new(DefaultExtractor),
            state: Cell::new(InstallState::Idle),
        }
    }

    /// Send progress messages to `status`
    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Replace the archive extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Current (or, after `install`, final) state
    pub fn state(&self) -> InstallState {
        self.state.get()
    }

    fn transition(&self, next: InstallState) {
        debug!("Install state: {} -> {}", self.state.get(), next);
        self.state.set(next);
    }

    fn notify(&self, message: &str) {
        self.status.notify(message);
    }

    /// Preview which entries would be backed up, without changing anything
    ///
    /// Conflicts are computed against the target as it is now, so an entry
    /// that only appears once an earlier package is extracted is reported as
    /// missing. Fails if any package archive does not exist.
    pub fn plan(&self) -> Result<Vec<BackupPlan>> {
        let missing: Vec<String> = self
            .manifest
            .packages
            .iter()
            .filter(|p| !p.archive.is_file())
            .map(|p| p.archive.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Archive(format!(
                "Archive not found: {}",
                missing.join(", ")
            )));
        }

        let backup = BackupRoot::generate(&self.config.target, &self.config.backup_prefix)?;
        let planner = BackupPlanner::new(&self.config.target, &backup);

        self.manifest
            .packages
            .iter()
            .map(|package| planner.plan(package))
            .collect()
    }

    /// Run the install
    ///
    /// Never fails: errors are reported through the status sink and the
    /// returned report.
    pub fn install(&self) -> InstallReport {
        let span = info_span!("install", root = %self.config.target.display());
        let _enter = span.enter();

        self.transition(InstallState::Idle);
        info!(
            "Installing {} package(s) into {}",
            self.manifest.len(),
            self.config.target.display()
        );

        let mut progress = RunProgress::default();
        let result = self.run(&mut progress);

        let (error, failed_package) = match result {
            Ok(()) => {
                self.transition(InstallState::Done);
                info!("Installed {} package(s)", progress.packages_installed);
                self.notify(COMPLETE_MESSAGE);
                (None, None)
            }
            Err(err) => {
                let failed_package = self.state.get().package_index();
                self.transition(InstallState::Failed);
                error!("Install failed: {}", err);
                self.notify(&err.to_string());
                if let Some(root) = &progress.backup_root {
                    discard_if_empty(root);
                }
                (Some(err), failed_package)
            }
        };

        let backup_retained = progress
            .backup_root
            .as_deref()
            .is_some_and(Path::exists);

        InstallReport {
            outcome: InstallOutcome::from_run(error.is_some(), progress.packages_installed),
            packages_installed: progress.packages_installed,
            last_completed: progress.last_completed,
            failed_package,
            error,
            backup_root: progress.backup_root,
            backup_retained,
            backed_up: progress.backed_up,
            extracted: progress.extracted,
        }
    }

    fn run(&self, progress: &mut RunProgress) -> Result<()> {
        let target = &self.config.target;
        fs::create_dir_all(target)
            .map_err(|e| Error::io_at("Failed to create target directory", target, e))?;

        let backup = BackupRoot::create(target, &self.config.backup_prefix)?;
        progress.backup_root = Some(backup.path().to_path_buf());
        debug!("Backup root: {}", backup.path().display());

        let planner = BackupPlanner::new(target, &backup).with_status(self.status.as_ref());

        for (index, package) in self.manifest.packages.iter().enumerate() {
            self.transition(InstallState::BackingUp(index));
            let moved = planner.backup(package)?;
            progress.backed_up.extend(moved);

            self.notify(&format!("Installing {}...", package.description));
            self.transition(InstallState::Extracting(index));
            let stats = self.extractor.extract(&package.archive, target)?;
            progress.record_extracted(index, stats);
        }

        self.transition(InstallState::Finalizing);
        backup.remove_if_empty()?;
        Ok(())
    }
}

/// Best-effort removal of an untouched backup root after a failed run
fn discard_if_empty(root: &Path) {
    if let Err(e) = BackupRoot::at(root).remove_if_empty() {
        warn!("Could not clean up backup directory {}: {}", root.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Package;
    use crate::progress::RecordingStatus;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes a fixed set of files instead of reading a real archive
    struct FakeExtractor {
        files: Vec<(&'static str, &'static str)>,
        fail_on: Option<PathBuf>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl FakeExtractor {
        fn new(files: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                files,
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, archive: impl Into<PathBuf>) -> Self {
            self.fail_on = Some(archive.into());
            self
        }
    }

    impl ArchiveExtractor for FakeExtractor {
        fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractStats> {
            self.calls.lock().unwrap().push(archive.to_path_buf());
            if self.fail_on.as_deref() == Some(archive) {
                return Err(Error::Archive(format!("{}: corrupt", archive.display())));
            }
            for (name, content) in &self.files {
                let path = dest.join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            Ok(ExtractStats {
                files: self.files.len(),
                ..Default::default()
            })
        }
    }

    fn installer(
        target: &Path,
        manifest: Manifest,
        extractor: FakeExtractor,
    ) -> (Installer, Arc<RecordingStatus>) {
        let status = Arc::new(RecordingStatus::new());
        let installer = Installer::new(manifest, InstallerConfig::new(target))
            .with_status(status.clone())
            .with_extractor(Arc::new(extractor));
        (installer, status)
    }

    #[test]
    fn test_config_defaults() {
        let config = InstallerConfig::new("/games/halo");
        assert_eq!(config.backup_prefix, DEFAULT_BACKUP_PREFIX);

        let config = config.with_backup_prefix("SPV3");
        assert_eq!(config.backup_prefix, "SPV3");
    }

    #[test]
    fn test_message_sequence_without_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new()
            .push(Package::new("a.zip", "core files").with_file("game.exe"))
            .push(Package::new("b.zip", "maps").with_dir("maps"));
        let (installer, status) =
            installer(temp_dir.path(), manifest, FakeExtractor::new(vec![("game.exe", "new")]));

        let report = installer.install();

        assert_eq!(
            status.messages(),
            vec![
                "Installing core files...",
                "Installing maps...",
                "Installation is complete!"
            ]
        );
        assert_eq!(report.outcome, InstallOutcome::Completed);
        assert_eq!(report.packages_installed, 2);
        assert_eq!(report.last_completed, Some(1));
        assert_eq!(installer.state(), InstallState::Done);
        assert!(installer.state().is_terminal());
        assert!(!report.backup_retained);
        assert!(!report.backup_root.unwrap().exists());
    }

    #[test]
    fn test_status_uses_description_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new()
            .push(Package::new("a.zip", ""))
            .push(Package::new("b.zip", "Base Game"));
        let (installer, status) = installer(temp_dir.path(), manifest, FakeExtractor::new(vec![]));

        installer.install();

        assert_eq!(
            status.messages(),
            vec!["Installing ...", "Installing Base Game...", COMPLETE_MESSAGE]
        );
    }

    #[test]
    fn test_conflict_is_backed_up_before_extraction() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.exe"), "original").unwrap();
        let manifest =
            Manifest::new().push(Package::new("a.zip", "core files").with_file("game.exe"));
        let (installer, status) =
            installer(temp_dir.path(), manifest, FakeExtractor::new(vec![("game.exe", "new")]));

        let report = installer.install();

        assert!(report.is_success());
        assert!(report.backup_retained);
        let backup_root = report.backup_root.unwrap();
        assert_eq!(
            fs::read_to_string(backup_root.join("game.exe")).unwrap(),
            "original"
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("game.exe")).unwrap(),
            "new"
        );
        assert_eq!(
            status.messages(),
            vec![
                "Backing up game.exe...",
                "Installing core files...",
                "Installation is complete!"
            ]
        );
    }

    #[test]
    fn test_extraction_failure_is_reported_not_raised() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new()
            .push(Package::new("a.zip", "first"))
            .push(Package::new("b.zip", "second"))
            .push(Package::new("c.zip", "third"));
        let extractor = FakeExtractor::new(vec![("a.txt", "a")]).failing_on("b.zip");
        let (installer, status) = installer(temp_dir.path(), manifest, extractor);

        let report = installer.install();

        assert_eq!(report.outcome, InstallOutcome::Partial);
        assert_eq!(report.packages_installed, 1);
        assert_eq!(report.last_completed, Some(0));
        assert_eq!(report.failed_package, Some(1));
        assert_eq!(report.error_kind(), Some(crate::ErrorKind::Archive));
        assert_eq!(installer.state(), InstallState::Failed);

        let last = status.last().unwrap();
        assert!(last.contains("corrupt"));
        assert!(!status.messages().iter().any(|m| m == COMPLETE_MESSAGE));
        assert!(!status.messages().iter().any(|m| m == "Installing third..."));

        // Nothing was backed up, so the backup root is gone even on failure
        assert!(!report.backup_retained);
    }

    #[test]
    fn test_failure_on_first_package_is_failed_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new().push(Package::new("a.zip", "only"));
        let extractor = FakeExtractor::new(vec![]).failing_on("a.zip");
        let (installer, _status) = installer(temp_dir.path(), manifest, extractor);

        let report = installer.install();

        assert_eq!(report.outcome, InstallOutcome::Failed);
        assert_eq!(report.failed_package, Some(0));
        assert_eq!(report.last_completed, None);
    }

    #[test]
    fn test_failure_keeps_backups_from_earlier_packages() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.exe"), "original").unwrap();
        let manifest = Manifest::new()
            .push(Package::new("a.zip", "first").with_file("game.exe"))
            .push(Package::new("b.zip", "second"));
        let extractor = FakeExtractor::new(vec![("game.exe", "new")]).failing_on("b.zip");
        let (installer, _status) = installer(temp_dir.path(), manifest, extractor);

        let report = installer.install();

        assert_eq!(report.outcome, InstallOutcome::Partial);
        assert!(report.backup_retained);
        assert_eq!(report.backed_up.len(), 1);
        assert_eq!(
            fs::read_to_string(report.backup_root.unwrap().join("game.exe")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_packages_extract_in_manifest_order() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new()
            .push(Package::new("z.zip", "z"))
            .push(Package::new("a.zip", "a"))
            .push(Package::new("m.zip", "m"));
        let extractor = Arc::new(FakeExtractor::new(vec![]));
        let installer = Installer::new(manifest, InstallerConfig::new(temp_dir.path()))
            .with_extractor(extractor.clone());

        installer.install();

        assert_eq!(
            *extractor.calls.lock().unwrap(),
            vec![
                PathBuf::from("z.zip"),
                PathBuf::from("a.zip"),
                PathBuf::from("m.zip")
            ]
        );
    }

    #[test]
    fn test_creates_missing_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("new/install/dir");
        let manifest = Manifest::new().push(Package::new("a.zip", "a"));
        let (installer, _status) =
            installer(&target, manifest, FakeExtractor::new(vec![("x.txt", "x")]));

        let report = installer.install();

        assert!(report.is_success());
        assert!(target.join("x.txt").exists());
    }

    #[test]
    fn test_invalid_prefix_fails_before_any_package() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new().push(Package::new("a.zip", "a"));
        let status = Arc::new(RecordingStatus::new());
        let installer = Installer::new(
            manifest,
            InstallerConfig::new(temp_dir.path()).with_backup_prefix("../escape"),
        )
        .with_status(status.clone())
        .with_extractor(Arc::new(FakeExtractor::new(vec![])));

        let report = installer.install();

        assert_eq!(report.outcome, InstallOutcome::Failed);
        assert_eq!(report.failed_package, None);
        assert!(report.backup_root.is_none());
        assert_eq!(status.messages().len(), 1);
    }

    #[test]
    fn test_plan_reports_missing_archives() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new().push(Package::new(temp_dir.path().join("nope.zip"), "a"));
        let installer = Installer::new(manifest, InstallerConfig::new(temp_dir.path()));

        let err = installer.plan().unwrap_err();
        assert!(err.to_string().contains("nope.zip"));
    }

    #[test]
    fn test_plan_does_not_touch_target() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("a.zip");
        fs::write(&archive, "stub").unwrap();
        let target = temp_dir.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("game.exe"), "original").unwrap();
        let manifest = Manifest::new().push(
            Package::new(&archive, "a")
                .with_file("game.exe")
                .with_file("other.dll"),
        );
        let installer = Installer::new(manifest, InstallerConfig::new(&target));

        let plans = installer.plan().unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].conflicts().count(), 1);
        assert_eq!(fs::read_dir(&target).unwrap().count(), 1);
        assert_eq!(installer.state(), InstallState::Idle);
    }
}
