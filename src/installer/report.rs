// src/installer/report.rs

use crate::archive::ExtractStats;
use crate::backup::BackedUpEntry;
use crate::error::{Error, ErrorKind};
use std::path::PathBuf;

/// How an install run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every package was extracted
    Completed,
    /// Some packages were extracted before an error stopped the run
    Partial,
    /// The run stopped before any package was extracted
    Failed,
}

impl InstallOutcome {
    pub(super) fn from_run(failed: bool, packages_installed: usize) -> Self {
        match (failed, packages_installed) {
            (false, _) => Self::Completed,
            (true, 0) => Self::Failed,
            (true, _) => Self::Partial,
        }
    }
}

/// Result of [`Installer::install`](super::Installer::install)
#[derive(Debug)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    pub packages_installed: usize,
    /// Index of the last package whose archive was fully extracted
    pub last_completed: Option<usize>,
    /// Index of the package being processed when the run failed
    pub failed_package: Option<usize>,
    pub error: Option<Error>,
    /// Backup directory chosen for this run, if one was allocated
    pub backup_root: Option<PathBuf>,
    /// Whether the backup directory still exists (it holds displaced entries)
    pub backup_retained: bool,
    pub backed_up: Vec<BackedUpEntry>,
    /// Totals across all extracted archives
    pub extracted: ExtractStats,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.outcome == InstallOutcome::Completed
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }
}
