// src/lib.rs

//! safe-unpack
//!
//! Installs a sequence of archive packages into a target directory without
//! losing what was there before. Every path a package declares is checked
//! first; anything that already exists is moved into a per-run backup
//! directory under the target, and only then is the archive extracted over
//! the target.
//!
//! # Architecture
//!
//! - Manifest: ordered packages, each an archive plus the entries it writes
//! - Backup: per-package conflict planning and moves into `<prefix>-<uuid>/`
//! - Archive: zip and (compressed) tar extraction, overwriting in place
//! - Installer: drives the above in manifest order and reports the outcome
//!
//! ```no_run
//! use safe_unpack::{Installer, InstallerConfig, LogStatus, Manifest};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let manifest = Manifest::from_file(Path::new("packages.toml"))?;
//! let report = Installer::new(manifest, InstallerConfig::new("/games/halo"))
//!     .with_status(Arc::new(LogStatus::new("install")))
//!     .install();
//! println!("{:?}", report.outcome);
//! # Ok::<(), safe_unpack::Error>(())
//! ```

pub mod archive;
pub mod backup;
pub mod compression;
mod error;
pub mod filesystem;
pub mod installer;
pub mod manifest;
pub mod progress;

pub use archive::{ArchiveExtractor, ArchiveFormat, DefaultExtractor, ExtractStats};
pub use backup::{
    BackedUpEntry, BackupAction, BackupActionKind, BackupPlan, BackupPlanner, BackupRoot,
};
pub use error::{Error, ErrorKind, Result};
pub use installer::{
    InstallOutcome, InstallReport, InstallState, Installer, InstallerConfig, DEFAULT_BACKUP_PREFIX,
};
pub use manifest::{Entry, EntryType, Manifest, Package};
pub use progress::{CallbackStatus, LogStatus, RecordingStatus, SilentStatus, StatusSink};
