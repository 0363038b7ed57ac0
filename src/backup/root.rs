// src/backup/root.rs

use crate::error::{Error, Result};
use crate::filesystem::mover::is_dir_empty;
use crate::filesystem::path::validate_prefix;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const MAX_NAME_ATTEMPTS: usize = 8;

/// Per-run directory under the target that holds displaced entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRoot {
    path: PathBuf,
}

impl BackupRoot {
    /// Pick a fresh `<target>/<prefix>-<uuid>` that does not exist yet
    ///
    /// Nothing is created on disk. Used for previews; installs go through
    /// [`BackupRoot::create`].
    pub fn generate(target: &Path, prefix: &str) -> Result<Self> {
        let prefix = validate_prefix(prefix)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = target.join(format!("{}-{}", prefix, Uuid::new_v4()));
            if candidate.symlink_metadata().is_err() {
                return Ok(Self { path: candidate });
            }
            debug!("Backup name {} already taken, retrying", candidate.display());
        }

        Err(Error::BackupCollision(format!(
            "No free backup directory name under {} after {} attempts",
            target.display(),
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Pick a fresh `<target>/<prefix>-<uuid>` and create it atomically
    ///
    /// The name is claimed with a single `mkdir`, so a directory that appears
    /// between choosing the name and creating it is never reused. `target`
    /// must already exist.
    pub fn create(target: &Path, prefix: &str) -> Result<Self> {
        let prefix = validate_prefix(prefix)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = target.join(format!("{}-{}", prefix, Uuid::new_v4()));
            match fs::create_dir(&candidate) {
                Ok(()) => return Ok(Self { path: candidate }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Backup name {} already taken, retrying", candidate.display());
                }
                Err(e) => {
                    return Err(Error::io_at(
                        "Failed to create backup directory",
                        &candidate,
                        e,
                    ));
                }
            }
        }

        Err(Error::BackupCollision(format!(
            "No free backup directory name under {} after {} attempts",
            target.display(),
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Use an explicit path as the backup root
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the directory (and the target, if needed). Safe to call twice.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.path)
            .map_err(|e| Error::io_at("Failed to create backup directory", &self.path, e))
    }

    pub fn is_empty(&self) -> Result<bool> {
        is_dir_empty(&self.path)
    }

    /// Delete the directory if nothing was backed up into it
    ///
    /// Returns `true` if it was removed (or was already gone).
    pub fn remove_if_empty(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }
        if !self.is_empty()? {
            info!("Backup retained at {}", self.path.display());
            return Ok(false);
        }

        fs::remove_dir(&self.path)
            .map_err(|e| Error::io_at("Failed to remove backup directory", &self.path, e))?;
        debug!("Removed empty backup directory {}", self.path.display());
        Ok(true)
    }
}
