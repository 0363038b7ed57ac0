// src/backup/mod.rs

//! Backup of conflicting entries before extraction
//!
//! Extraction overwrites whatever already sits at an entry's path. Before a
//! package's archive is unpacked, every entry it declares is checked at the
//! target; the ones that already exist are moved under a backup root that
//! mirrors the target's layout:
//!
//! ```text
//! <target>/D/x/y.bin   ->   <target>/<prefix>-<uuid>/D/x/y.bin
//! ```
//!
//! When two packages in one run declare the same entry, the second backup
//! finds the mirrored path already taken and uses `<name>.1`, `<name>.2`, ...
//! instead, so no earlier backup is ever replaced.
//!
//! The entry's declared type is authoritative. A `File` entry only matches a
//! file on disk and a `Directory` entry only matches a directory; anything
//! else is left in place.

mod root;

pub use root::BackupRoot;

use crate::error::Result;
use crate::filesystem::mover::{move_dir, move_file};
use crate::filesystem::path::safe_join;
use crate::manifest::{Entry, EntryType, Package};
use crate::progress::{SilentStatus, StatusSink};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_DUPLICATE_BACKUPS: u32 = 999;

/// What will happen to one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupActionKind {
    /// Present with the declared type: moved into the backup root
    Move,
    /// Not present: nothing to preserve
    Skip,
    /// Present, but as the other type: left where it is
    TypeMismatch,
}

/// Planned handling of one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupAction {
    pub entry: Entry,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: BackupActionKind,
}

/// Planned handling of every entry in one package
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub description: String,
    /// Directory the package's entries live in under the target
    pub source_dir: PathBuf,
    /// Matching directory under the backup root
    pub backup_dir: PathBuf,
    pub actions: Vec<BackupAction>,
}

impl BackupPlan {
    /// Entries that will be moved
    pub fn conflicts(&self) -> impl Iterator<Item = &BackupAction> {
        self.actions
            .iter()
            .filter(|a| a.kind == BackupActionKind::Move)
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflicts().next().is_some()
    }
}

/// An entry that was moved out of the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackedUpEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Moves a package's pre-existing entries into the backup root
pub struct BackupPlanner<'a> {
    target: &'a Path,
    backup: &'a BackupRoot,
    status: &'a dyn StatusSink,
}

impl<'a> BackupPlanner<'a> {
    pub fn new(target: &'a Path, backup: &'a BackupRoot) -> Self {
        Self {
            target,
            backup,
            status: &SilentStatus,
        }
    }

    /// Report "Backing up ..." lines to `status`
    pub fn with_status(mut self, status: &'a dyn StatusSink) -> Self {
        self.status = status;
        self
    }

    /// The package's directory under the target and under the backup root
    pub fn package_dirs(&self, package: &Package) -> Result<(PathBuf, PathBuf)> {
        match package.effective_directory() {
            None => Ok((self.target.to_path_buf(), self.backup.path().to_path_buf())),
            Some(dir) => Ok((
                safe_join(self.target, dir)?,
                safe_join(self.backup.path(), dir)?,
            )),
        }
    }

    /// Work out what `backup` would do, without touching the filesystem
    pub fn plan(&self, package: &Package) -> Result<BackupPlan> {
        let (source_dir, backup_dir) = self.package_dirs(package)?;

        let actions = package
            .entries
            .iter()
            .map(|entry| {
                let source = safe_join(&source_dir, &entry.name)?;
                let destination = safe_join(&backup_dir, &entry.name)?;
                let kind = classify(entry.entry_type, &source);
                Ok(BackupAction {
                    entry: entry.clone(),
                    source,
                    destination,
                    kind,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BackupPlan {
            description: package.label(),
            source_dir,
            backup_dir,
            actions,
        })
    }

    /// Move every conflicting entry of `package` into the backup root
    ///
    /// Entries are handled in manifest order. Missing entries and type
    /// mismatches are not conflicts. The first filesystem error aborts and
    /// is returned.
    pub fn backup(&self, package: &Package) -> Result<Vec<BackedUpEntry>> {
        let (source_dir, backup_dir) = self.package_dirs(package)?;
        let mut moved = Vec::new();

        for entry in &package.entries {
            let source = safe_join(&source_dir, &entry.name)?;
            let mirrored = safe_join(&backup_dir, &entry.name)?;

            match classify(entry.entry_type, &source) {
                BackupActionKind::Skip => {
                    debug!("No existing {} at {}", entry.entry_type, source.display());
                    continue;
                }
                BackupActionKind::TypeMismatch => {
                    warn!(
                        "{} is declared as a {} but exists as something else; leaving it in place",
                        source.display(),
                        entry.entry_type
                    );
                    continue;
                }
                BackupActionKind::Move => {}
            }

            let destination = unclaimed(&mirrored)?;

            // Created on demand so a conflict-free run leaves the backup root empty
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    crate::Error::io_at("Failed to create backup directory", parent, e)
                })?;
            }

            self.status.notify(&format!("Backing up {}...", entry.name));
            info!("Backing up {} -> {}", source.display(), destination.display());

            match entry.entry_type {
                EntryType::File => move_file(&source, &destination)?,
                EntryType::Directory => move_dir(&source, &destination)?,
            }

            moved.push(BackedUpEntry {
                name: entry.name.clone(),
                entry_type: entry.entry_type,
                source,
                destination,
            });
        }

        Ok(moved)
    }
}

/// `path` itself, or the first free `path.N` when an earlier move took it
fn unclaimed(path: &Path) -> Result<PathBuf> {
    if path.symlink_metadata().is_err() {
        return Ok(path.to_path_buf());
    }

    for n in 1..=MAX_DUPLICATE_BACKUPS {
        let mut name = OsString::from(path.as_os_str());
        name.push(format!(".{}", n));
        let candidate = PathBuf::from(name);
        if candidate.symlink_metadata().is_err() {
            warn!(
                "{} already holds an earlier backup, using {}",
                path.display(),
                candidate.display()
            );
            return Ok(candidate);
        }
    }

    Err(crate::Error::IoError(format!(
        "No free backup name for {} after {} attempts",
        path.display(),
        MAX_DUPLICATE_BACKUPS
    )))
}

fn classify(entry_type: EntryType, source: &Path) -> BackupActionKind {
    match (entry_type, fs::metadata(source)) {
        (_, Err(_)) => BackupActionKind::Skip,
        (EntryType::File, Ok(meta)) if meta.is_file() => BackupActionKind::Move,
        (EntryType::Directory, Ok(meta)) if meta.is_dir() => BackupActionKind::Move,
        (_, Ok(_)) => BackupActionKind::TypeMismatch,
    }
}
